pub mod merged;
pub mod settings;

use settings::Settings;
use std::path::Path;

pub const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// 入力パスからsettings.yamlを自動検出して読み込む。
///
/// 入力がディレクトリならその中、ファイルなら同じディレクトリに
/// `settings.yaml` が存在すれば読み込み、存在しなければデフォルト設定を返す。
pub fn load_settings_for_input(input_path: &Path) -> crate::error::Result<Settings> {
    let dir = if input_path.is_dir() {
        input_path
    } else {
        match input_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    };

    let settings_path = dir.join(SETTINGS_FILE_NAME);

    if settings_path.is_file() {
        Settings::from_file(&settings_path)
    } else {
        Ok(Settings::default())
    }
}
