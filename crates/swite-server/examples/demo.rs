//! Run a dev server over a throwaway demo workspace.
//!
//! ```sh
//! cargo run --example demo -p swite-server
//! ```
//!
//! The demo uses the echo compiler, so `.ui` sources are served with their
//! imports rewritten but otherwise unchanged. Useful for poking at the URL
//! surface with curl:
//!
//! ```sh
//! curl http://127.0.0.1:3000/src/index.ui
//! curl http://127.0.0.1:3000/__swite_diagnose?url=/src/index.ui
//! ```

use std::fs;
use std::sync::Arc;

use swite_server::testing::EchoCompiler;
use swite_server::{DevConfig, DevServer, DevState, PassthroughTransformer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("swite_core=debug,swite_server=debug").init();

    let temp = tempfile::TempDir::new()?;
    let root = temp.path().canonicalize()?;

    fs::write(root.join("pnpm-workspace.yaml"), "packages:\n  - packages/*\n")?;
    fs::create_dir_all(root.join("packages"))?;

    let app_root = root.join("app");
    fs::create_dir_all(app_root.join("src"))?;
    fs::write(
        app_root.join("src/index.ui"),
        "import { SwissApp } from '@swissjs/core';\nexport const app = new SwissApp();\n",
    )?;
    fs::write(
        app_root.join("src/App.uix"),
        "export const App = () => 'hello';\n",
    )?;

    let core = root.join("swiss-lib/packages/core");
    fs::create_dir_all(core.join("src"))?;
    fs::write(
        core.join("package.json"),
        r#"{ "name": "@swissjs/core", "exports": { ".": "./src/index.ts" } }"#,
    )?;
    fs::write(core.join("src/index.ts"), "export class SwissApp {}\n")?;

    let config = DevConfig::load(app_root, Some(3000))?;
    println!("demo workspace at {}", root.display());
    println!("serving {}", config.server_url());

    let state = Arc::new(DevState::new(
        config,
        Arc::new(EchoCompiler),
        Arc::new(PassthroughTransformer),
    ));
    DevServer::new(state).start().await?;
    Ok(())
}
