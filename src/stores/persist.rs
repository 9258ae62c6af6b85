//! 存储文件读写
//!
//! 两个持久化存储（错题本、聊天存档）各自是一个扁平的 JSON 记录文件。
//! 读取侧：文件不存在或内容损坏都按空存储处理并记录警告，绝不崩溃。
//! 写入侧：先写临时文件再原子重命名，部分写入不会留下无法解析的文件。

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::StoreError;

/// 读取整个存储文件为顶层 JSON 对象
pub(crate) fn load(path: &Path) -> Map<String, Value> {
    if !path.exists() {
        return Map::new();
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("读取存储文件失败，按空存储处理: {} ({})", path.display(), e);
            return Map::new();
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("存储文件顶层不是对象，按空存储处理: {}", path.display());
            Map::new()
        }
        Err(e) => {
            warn!("存储文件损坏，按空存储处理: {} ({})", path.display(), e);
            Map::new()
        }
    }
}

/// 整体写回存储文件（临时文件 + 原子重命名）
pub(crate) fn save(path: &Path, data: &Map<String, Value>) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(data)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let map = load(&dir.path().join("nonexistent.json"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        fs::write(&path, "{这不是 JSON").unwrap();
        let map = load(&path);
        assert!(map.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut data = Map::new();
        data.insert("1".to_string(), json!({"description": "题目"}));
        save(&path, &data).unwrap();

        let loaded = load(&path);
        assert_eq!(loaded, data);
        // 临时文件不残留
        assert!(!path.with_extension("json.tmp").exists());
    }
}
