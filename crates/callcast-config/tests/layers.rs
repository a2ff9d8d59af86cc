//! Layered loading through the public crate surface.

use callcast_config::{CONFIG_FILE_NAME, CallcastConfig, ConfigLayerSource, LayeredConfigOptions};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

/// A `callcast.json5` in the working directory is picked up as the cwd layer.
#[test]
fn cwd_file_uses_exported_name() {
    assert_eq!(CONFIG_FILE_NAME, "callcast.json5");

    let temp = TempDir::new().expect("tmp");
    fs::write(
        temp.path().join(CONFIG_FILE_NAME),
        "{ server: { port: 9100 }, hub: { snapshot_size: 7 } }",
    )
    .expect("write");

    let layered = CallcastConfig::load_layered_with_options(LayeredConfigOptions::isolated(
        temp.path(),
    ))
    .expect("layered");

    assert_eq!(layered.config.server.port, 9100);
    assert_eq!(layered.config.hub.snapshot_size, 7);
    let sources: Vec<ConfigLayerSource> = layered.layers.iter().map(|l| l.source).collect();
    assert_eq!(sources, vec![ConfigLayerSource::Cwd]);
}
