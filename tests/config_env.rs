use oxide_music_bot::config::Settings;
use std::env;
use std::path::PathBuf;

// Own test binary and a single test, so nothing else touches the environment meanwhile
#[test]
fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Token and overrides are picked up
    env::set_var("TELEGRAM_BOT_TOKEN", "123456789:dummy_token");
    env::set_var("YTDLP_PATH", "/opt/bin/yt-dlp");
    env::set_var("DOWNLOAD_DIR", "/var/tmp/music");

    let settings = Settings::new()?;
    assert_eq!(settings.telegram_bot_token, "123456789:dummy_token");
    assert_eq!(settings.ytdlp_path, "/opt/bin/yt-dlp");
    assert_eq!(settings.download_root(), PathBuf::from("/var/tmp/music"));

    env::remove_var("YTDLP_PATH");
    env::remove_var("DOWNLOAD_DIR");

    // 2. Defaults apply when optional keys are absent
    let settings = Settings::new()?;
    assert_eq!(settings.ytdlp_path, "yt-dlp");
    assert_eq!(settings.download_root(), env::temp_dir());

    // 3. Empty token is treated as missing
    env::set_var("TELEGRAM_BOT_TOKEN", "");
    assert!(Settings::new().is_err());

    // 4. Missing token is an error
    env::remove_var("TELEGRAM_BOT_TOKEN");
    assert!(Settings::new().is_err());
    Ok(())
}
