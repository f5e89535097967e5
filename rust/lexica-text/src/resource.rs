//! Mapping between logical resource identifiers and concrete file paths.
//!
//! A resource type contributes a fixed prefix and suffix (say,
//! `luna_pinyin` ↔ `build/luna_pinyin.dict.bin`); the resolver adds or
//! strips them and anchors relative ids under a root directory. The
//! fallback variant consults a second root when the default path does not
//! exist, which is how a user directory shadows a shared install.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ResourceType {
    pub name: String,
    pub prefix: String,
    pub suffix: String,
}

impl ResourceType {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> ResourceType {
        ResourceType {
            name: name.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

pub struct ResourceResolver {
    resource_type: ResourceType,
    root_path: PathBuf,
}

impl ResourceResolver {
    pub fn new(resource_type: ResourceType, root_path: impl Into<PathBuf>) -> ResourceResolver {
        ResourceResolver {
            resource_type,
            root_path: root_path.into(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn set_root_path(&mut self, root_path: impl Into<PathBuf>) {
        self.root_path = root_path.into();
    }

    /// Strips the type's prefix and suffix from a file path, yielding the
    /// bare resource id.
    pub fn to_resource_id(&self, file_path: &str) -> String {
        let ty = &self.resource_type;
        let start = if file_path.starts_with(&ty.prefix) {
            ty.prefix.len()
        } else {
            0
        };
        let end = if file_path.ends_with(&ty.suffix) {
            file_path.len() - ty.suffix.len()
        } else {
            file_path.len()
        };
        file_path[start..end].to_string()
    }

    /// Adds the type's prefix and suffix to a resource id where missing.
    /// An id that already names a directory component keeps its path as-is.
    pub fn to_file_path(&self, resource_id: &str) -> String {
        let ty = &self.resource_type;
        let missing_prefix = Path::new(resource_id).parent().is_none_or(|p| p.as_os_str().is_empty())
            && !resource_id.starts_with(&ty.prefix);
        let missing_suffix = !resource_id.ends_with(&ty.suffix);
        format!(
            "{}{}{}",
            if missing_prefix { &ty.prefix } else { "" },
            resource_id,
            if missing_suffix { &ty.suffix } else { "" }
        )
    }

    /// The absolute path of a resource under the resolver's root.
    pub fn resolve_path(&self, resource_id: &str) -> PathBuf {
        let ty = &self.resource_type;
        let name = format!("{}{}{}", ty.prefix, resource_id, ty.suffix);
        std::path::absolute(&self.root_path)
            .unwrap_or_else(|_| self.root_path.clone())
            .join(name)
    }
}

/// A resolver with a second search root, consulted when the resource is
/// absent under the default root.
pub struct FallbackResourceResolver {
    resolver: ResourceResolver,
    fallback_root_path: PathBuf,
}

impl FallbackResourceResolver {
    pub fn new(
        resource_type: ResourceType,
        root_path: impl Into<PathBuf>,
        fallback_root_path: impl Into<PathBuf>,
    ) -> FallbackResourceResolver {
        FallbackResourceResolver {
            resolver: ResourceResolver::new(resource_type, root_path),
            fallback_root_path: fallback_root_path.into(),
        }
    }

    pub fn to_resource_id(&self, file_path: &str) -> String {
        self.resolver.to_resource_id(file_path)
    }

    pub fn to_file_path(&self, resource_id: &str) -> String {
        self.resolver.to_file_path(resource_id)
    }

    pub fn resolve_path(&self, resource_id: &str) -> PathBuf {
        let default_path = self.resolver.resolve_path(resource_id);
        if !default_path.exists() {
            let ty = &self.resolver.resource_type;
            let name = format!("{}{}{}", ty.prefix, resource_id, ty.suffix);
            let fallback_path = std::path::absolute(&self.fallback_root_path)
                .unwrap_or_else(|_| self.fallback_root_path.clone())
                .join(name);
            if fallback_path.exists() {
                return fallback_path;
            }
        }
        default_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict_type() -> ResourceType {
        ResourceType::new("dictionary", "build/", ".dict.bin")
    }

    #[test]
    fn test_resource_id_round_trip() {
        let resolver = ResourceResolver::new(dict_type(), ".");
        assert_eq!(resolver.to_resource_id("build/pinyin.dict.bin"), "pinyin");
        assert_eq!(resolver.to_resource_id("pinyin"), "pinyin");
        assert_eq!(resolver.to_file_path("pinyin"), "build/pinyin.dict.bin");
        assert_eq!(
            resolver.to_file_path("build/pinyin.dict.bin"),
            "build/pinyin.dict.bin"
        );
    }

    #[test]
    fn test_file_path_keeps_explicit_directories() {
        let resolver = ResourceResolver::new(dict_type(), ".");
        assert_eq!(
            resolver.to_file_path("custom/dir/pinyin"),
            "custom/dir/pinyin.dict.bin",
            "an id with a directory component gets no prefix"
        );
    }

    #[test]
    fn test_resolve_path_is_rooted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = ResourceResolver::new(dict_type(), dir.path());
        let path = resolver.resolve_path("pinyin");
        assert!(path.is_absolute());
        assert!(path.ends_with("build/pinyin.dict.bin"));
        assert!(path.starts_with(dir.path()));
    }

    #[test]
    fn test_fallback_resolution() {
        let primary = tempfile::tempdir().expect("tempdir");
        let fallback = tempfile::tempdir().expect("tempdir");
        let resolver =
            FallbackResourceResolver::new(dict_type(), primary.path(), fallback.path());

        // Nothing exists anywhere: the default path is reported.
        let path = resolver.resolve_path("pinyin");
        assert!(path.starts_with(primary.path()));

        // Present only under the fallback root.
        let fallback_file = fallback.path().join("build/pinyin.dict.bin");
        std::fs::create_dir_all(fallback_file.parent().unwrap()).expect("mkdir");
        std::fs::write(&fallback_file, b"x").expect("write");
        assert_eq!(resolver.resolve_path("pinyin"), fallback_file);

        // The default root wins once the resource appears there.
        let primary_file = primary.path().join("build/pinyin.dict.bin");
        std::fs::create_dir_all(primary_file.parent().unwrap()).expect("mkdir");
        std::fs::write(&primary_file, b"x").expect("write");
        assert_eq!(resolver.resolve_path("pinyin"), primary_file);
    }
}
