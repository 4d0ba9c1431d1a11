use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match caregraph_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("caregraph: {e}");
            ExitCode::FAILURE
        }
    }
}
