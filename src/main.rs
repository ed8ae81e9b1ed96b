use anyhow::Result;

fn main() -> Result<()> {
    famtree::run()
}
