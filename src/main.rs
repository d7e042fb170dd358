use env_logger::Env;
use tinsel::{SceneConfig, TinselApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = SceneConfig::from_env();
    let mut app = TinselApp::new(config)?;

    // Image paths on the command line are added like dropped files
    for path in std::env::args_os().skip(1) {
        app.add_photo_file(path);
    }

    app.run()
}
