//! Controller process entry point.

use clap::Parser;
use mesh::{init_tracing, ControllerArgs};

#[tokio::main]
async fn main() {
    init_tracing();
    let args = ControllerArgs::parse();

    let template = match mesh_topology::load_template_from_file(&args.config_file) {
        Ok(template) => template,
        Err(err) => {
            eprintln!("failed to load config file {:?}: {err}", args.config_file);
            std::process::exit(1);
        }
    };

    if let Err(err) = mesh_controller::run(args.port, template, std::path::Path::new("Controller.log")).await {
        eprintln!("controller exited with error: {err:?}");
        std::process::exit(1);
    }
}
