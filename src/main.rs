use anyhow::Context;
use formdesk::configuration::get_configuration;
use formdesk::startup::Application;
use formdesk::telemetry::init_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration().context("Failed to read configuration.")?;
    init_subscriber("info".into(), std::io::stdout, &configuration.telemetry)?;

    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
