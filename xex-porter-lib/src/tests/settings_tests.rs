use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_uses_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings::load_with_env(&tmp.path().join("settings.toml"), no_env).unwrap();

    assert_eq!(settings.tool(Tool::XexTool), PathBuf::from("xextool"));
    assert_eq!(settings.tool_source(Tool::XexTool), SettingSource::Default);
    assert_eq!(settings.timeouts, Timeouts::default());
    assert!(!settings.verify_content);
    assert!(settings.pipeline_output_dir().ends_with("pipeline_output"));
}

#[test]
fn file_beats_env_beats_default() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.toml");
    std::fs::write(
        &path,
        "[tools]\nxextool = \"/opt/xex/xextool\"\n",
    )
    .unwrap();

    let env = |var: &str| match var {
        "XEXTOOL_PATH" => Some("/env/xextool".to_string()),
        "XENON_ANALYSE_PATH" => Some("/env/XenonAnalyse".to_string()),
        _ => None,
    };
    let settings = Settings::load_with_env(&path, env).unwrap();

    assert_eq!(settings.tool(Tool::XexTool), PathBuf::from("/opt/xex/xextool"));
    assert_eq!(settings.tool_source(Tool::XexTool), SettingSource::ConfigFile);

    assert_eq!(settings.tool(Tool::XenonAnalyse), PathBuf::from("/env/XenonAnalyse"));
    assert_eq!(
        settings.tool_source(Tool::XenonAnalyse),
        SettingSource::EnvVar("XENON_ANALYSE_PATH")
    );

    assert_eq!(settings.tool(Tool::ExtractXiso), PathBuf::from("extract-xiso"));
    assert_eq!(settings.tool_source(Tool::ExtractXiso), SettingSource::Default);
}

#[test]
fn empty_values_fall_through() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.toml");
    std::fs::write(&path, "[tools]\nxextool = \"\"\n").unwrap();

    let env = |var: &str| (var == "XEXTOOL_PATH").then(|| "  ".to_string());
    let settings = Settings::load_with_env(&path, env).unwrap();
    assert_eq!(settings.tool_source(Tool::XexTool), SettingSource::Default);
}

#[test]
fn temp_dir_honours_env() {
    let env = |var: &str| (var == TEMP_BASE_ENV).then(|| "/scratch/x360".to_string());
    let settings = Settings::from_env(env);
    assert_eq!(settings.temp_dir, PathBuf::from("/scratch/x360"));
    assert_eq!(
        settings.pipeline_output_dir(),
        PathBuf::from("/scratch/x360").join("pipeline_output")
    );
}

#[test]
fn sections_are_read() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.toml");
    std::fs::write(
        &path,
        r#"
[paths]
ports_root = "/ports"
database = "/db/games.db"
profiles_dir = "/profiles"

[timeouts]
dump = 10
analyse = 20

[workspace]
verify_content = true
"#,
    )
    .unwrap();

    let settings = Settings::load_with_env(&path, no_env).unwrap();
    assert_eq!(settings.ports_root, PathBuf::from("/ports"));
    assert_eq!(settings.database, PathBuf::from("/db/games.db"));
    assert_eq!(settings.profiles_dir, PathBuf::from("/profiles"));
    assert_eq!(settings.timeouts.dump, 10);
    assert_eq!(settings.timeouts.analyse, 20);
    // Keys left out of a present section keep their defaults
    assert_eq!(settings.timeouts.extract, Timeouts::default().extract);
    assert!(settings.verify_content);
}

#[test]
fn invalid_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();
    let err = Settings::load_with_env(&path, no_env).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn save_preserves_unknown_keys_and_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("cfg").join("settings.toml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[gui]\ntheme = \"dark\"\n").unwrap();

    let mut settings = Settings::load_with_env(&path, no_env).unwrap();
    settings.set_tool(Tool::DiscImageCreator, "/tools/DiscImageCreator");
    settings.verify_content = true;
    settings.timeouts.clean = 5;
    settings.save_to(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("theme"));
    assert!(!path.with_extension("toml.tmp").exists());

    let reloaded = settings.reload().unwrap();
    assert_eq!(reloaded.tool(Tool::DiscImageCreator), PathBuf::from("/tools/DiscImageCreator"));
    assert_eq!(reloaded.tool_source(Tool::DiscImageCreator), SettingSource::ConfigFile);
    assert!(reloaded.verify_content);
    assert_eq!(reloaded.timeouts.clean, 5);
    // Default-sourced tools are not written out
    assert!(!text.contains("extract_xiso"));
}

#[test]
fn reload_returns_fresh_value() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("settings.toml");
    let settings = Settings::load_with_env(&path, no_env).unwrap();

    std::fs::write(&path, "[workspace]\nverify_content = true\n").unwrap();
    let fresh = settings.reload().unwrap();
    assert!(fresh.verify_content);
    assert!(!settings.verify_content);
}
