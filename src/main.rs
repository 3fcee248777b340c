#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vm_manage::bootstrapper::run().await
}
