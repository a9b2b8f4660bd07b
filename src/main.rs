use lumen_ngin::{config::DemoConfig, flow};

fn main() -> anyhow::Result<()> {
    flow::run(DemoConfig::from_env())
}
