//! Archive tree nodes and restore selections.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Kind of a node in the archive tree.
///
/// Serialized lowercase; parsed case-insensitively since storage nodes are
/// not consistent about casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Regular file
    File,
    /// Directory
    Directory,
}

impl FileType {
    /// Check if this node type can have children.
    pub fn is_directory(&self) -> bool {
        *self == FileType::Directory
    }
}

impl<'de> Deserialize<'de> for FileType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        match value.to_ascii_lowercase().as_str() {
            "file" => Ok(FileType::File),
            "directory" => Ok(FileType::Directory),
            _ => Err(de::Error::unknown_variant(&value, &["file", "directory"])),
        }
    }
}

/// A node of a device's archive as reported by the storage node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Node identifier, stable within a restore session
    pub id: String,
    /// Full posix-style path
    pub path: String,
    /// Node type
    #[serde(rename = "type")]
    pub file_type: FileType,
}

impl FileNode {
    /// Compare this node's path with `path`, ignoring case.
    pub fn path_matches(&self, path: &str) -> bool {
        self.path.to_lowercase() == path.to_lowercase()
    }
}

/// Entry of the path set sent with a restore request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSet {
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub path: String,
    pub selected: bool,
}

/// Size accounting for one node, used for progress and quota estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSizeInfo {
    pub num_files: u64,
    pub num_dirs: u64,
    pub size: u64,
}

impl FileSizeInfo {
    /// Uniform stand-in used when size calculation is skipped.
    pub fn placeholder() -> Self {
        Self {
            num_files: 1,
            num_dirs: 1,
            size: 1,
        }
    }
}

/// One resolved path, ready to be submitted for restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    path_set: PathSet,
    num_files: u64,
    num_dirs: u64,
    size: u64,
}

impl FileSelection {
    pub fn new(node: &FileNode, size_info: FileSizeInfo) -> Self {
        Self {
            path_set: PathSet {
                file_type: node.file_type,
                path: node.path.clone(),
                selected: true,
            },
            num_files: size_info.num_files,
            num_dirs: size_info.num_dirs,
            size: size_info.size,
        }
    }

    pub fn path_set(&self) -> &PathSet {
        &self.path_set
    }

    pub fn file_type(&self) -> FileType {
        self.path_set.file_type
    }

    pub fn num_files(&self) -> u64 {
        self.num_files
    }

    pub fn num_dirs(&self) -> u64 {
        self.num_dirs
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_type_wire_format() {
        let node: FileNode =
            serde_json::from_value(json!({"id": "1", "path": "C:/", "type": "directory"})).unwrap();
        assert_eq!(node.file_type, FileType::Directory);

        let node: FileNode =
            serde_json::from_value(json!({"id": "2", "path": "a.txt", "type": "FILE", "extra": 1}))
                .unwrap();
        assert_eq!(node.file_type, FileType::File);
        assert!(!node.file_type.is_directory());
    }

    #[test]
    fn test_file_type_parses_any_casing() {
        for raw in ["Directory", "dIrEcToRy", "DIRECTORY"] {
            let parsed: FileType = serde_json::from_value(json!(raw)).unwrap();
            assert_eq!(parsed, FileType::Directory);
        }
        let parsed: FileType = serde_json::from_value(json!("File")).unwrap();
        assert_eq!(parsed, FileType::File);

        assert!(serde_json::from_value::<FileType>(json!("symlink")).is_err());
        assert_eq!(serde_json::to_value(FileType::Directory).unwrap(), json!("directory"));
    }

    #[test]
    fn test_path_matches_ignores_case() {
        let node = FileNode {
            id: "1".to_string(),
            path: "Folder/Sub".to_string(),
            file_type: FileType::Directory,
        };
        assert!(node.path_matches("folder/sub"));
        assert!(node.path_matches("FOLDER/SUB"));
        assert!(!node.path_matches("folder/other"));
    }

    #[test]
    fn test_selection_from_node() {
        let node = FileNode {
            id: "7".to_string(),
            path: "/Users/a.txt".to_string(),
            file_type: FileType::File,
        };
        let selection = FileSelection::new(
            &node,
            FileSizeInfo {
                num_files: 1,
                num_dirs: 0,
                size: 42,
            },
        );
        assert!(selection.path_set().selected);
        assert_eq!(selection.path_set().path, "/Users/a.txt");
        assert_eq!(selection.size(), 42);
        assert_eq!(selection.num_dirs(), 0);

        let wire = serde_json::to_value(selection.path_set()).unwrap();
        assert_eq!(
            wire,
            json!({"type": "file", "path": "/Users/a.txt", "selected": true})
        );
    }

    #[test]
    fn test_size_info_wire_format() {
        let info: FileSizeInfo =
            serde_json::from_value(json!({"numFiles": 3, "numDirs": 1, "size": 900})).unwrap();
        assert_eq!(info.num_files, 3);
        assert_eq!(FileSizeInfo::placeholder().size, 1);
    }
}
