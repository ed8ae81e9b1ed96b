use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Machine-readable form of a layout result, for tooling and for
/// renderers that live outside this crate.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub placeholder: Option<String>,
    pub boxes: Vec<BoxDump>,
    pub couples: Vec<CoupleDump>,
    pub roots: Vec<usize>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
pub struct BoxDump {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct CoupleDump {
    pub husband: Option<i64>,
    pub wife: Option<i64>,
    pub kind: String,
    pub children: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub kind: String,
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub style: String,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let boxes = layout
            .boxes
            .values()
            .map(|person_box| BoxDump {
                id: person_box.id,
                name: person_box.name.clone(),
                gender: person_box.gender.as_str().to_string(),
                x: person_box.x,
                y: person_box.y,
                width: person_box.width,
                height: person_box.height,
            })
            .collect();

        let couples = layout
            .couples
            .iter()
            .map(|couple| CoupleDump {
                husband: couple.husband,
                wife: couple.wife,
                kind: format!("{:?}", couple.kind),
                children: couple.children.clone(),
            })
            .collect();

        let connectors = layout
            .connectors
            .iter()
            .map(|connector| ConnectorDump {
                kind: format!("{:?}", connector.kind),
                from: [connector.from.0, connector.from.1],
                to: [connector.to.0, connector.to.1],
                style: format!("{:?}", connector.style),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            offset_x: layout.offset_x,
            offset_y: layout.offset_y,
            placeholder: layout
                .placeholder
                .as_ref()
                .map(|placeholder| placeholder.message.clone()),
            boxes,
            couples,
            roots: layout.roots.clone(),
            connectors,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
