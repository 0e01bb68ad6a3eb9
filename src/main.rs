use std::process::ExitCode;

use flow_cube::{EngineConfig, flow, logging::init_logging};

fn main() -> ExitCode {
    let config = match EngineConfig::discover() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("flow-cube: {}", e);
            return ExitCode::from(1);
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("flow-cube: {}", e);
        return ExitCode::from(1);
    }

    match flow::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(1)
        }
    }
}
