//! Proto Registry — discovers services and methods from `.proto` files at
//! runtime and merges them into one [`ServiceCatalog`].
//!
//! Every file is compiled on its own with the directory as include root, so
//! imports between sibling files and the `google/protobuf/*` well-known types
//! resolve. Only services declared by the file itself are taken from it.

use std::path::Path;

use prost_reflect::{DescriptorPool, MethodDescriptor};

use crate::catalog::{MethodEntry, MethodKey, ServiceCatalog};
use crate::error::RegistryError;

pub const PROTO_SUFFIX: &str = ".proto";

/// Load every protocol description file in `dir` into a catalog.
pub fn load(dir: &Path) -> Result<ServiceCatalog, RegistryError> {
    let root = dir.canonicalize().map_err(|source| RegistryError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = proto_files(&root)?;
    if files.is_empty() {
        tracing::warn!("No {PROTO_SUFFIX} files found in {}", root.display());
    }

    let mut catalog = ServiceCatalog::default();
    for name in &files {
        let path = root.join(name);
        let pool = compile(&root, &path)?;
        let file = pool
            .get_file_by_name(name)
            .ok_or_else(|| RegistryError::MissingFile { file: path.clone() })?;

        let package = file.package_name().to_string();
        catalog.add_package(&package);

        let mut service_count = 0;
        for service in file.services() {
            let methods = service
                .methods()
                .map(|m| method_entry(&package, service.name(), &m, &path))
                .collect();
            catalog.add_service(&package, service.name(), &path, methods)?;
            service_count += 1;
        }
        tracing::info!(
            "Loaded {} ({} service(s), package '{}')",
            name,
            service_count,
            package
        );
    }

    tracing::info!(
        "Service catalog ready: {} package(s), {} service(s), {} method(s)",
        catalog.packages().len(),
        catalog.service_count(),
        catalog.method_count()
    );
    Ok(catalog)
}

/// File names (relative to `root`) of the top-level `.proto` files, sorted.
fn proto_files(root: &Path) -> Result<Vec<String>, RegistryError> {
    let dir_err = |source| RegistryError::Directory {
        path: root.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(root).map_err(dir_err)? {
        let entry = entry.map_err(dir_err)?;
        if !entry.file_type().map_err(dir_err)?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!("Skipping non UTF-8 file name in {}", root.display());
            continue;
        };
        if name.ends_with(PROTO_SUFFIX) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn compile(root: &Path, path: &Path) -> Result<DescriptorPool, RegistryError> {
    let parse_err = |source: protox::Error| RegistryError::Parse {
        file: path.to_path_buf(),
        source: Box::new(source),
    };
    let mut compiler = protox::Compiler::new([root]).map_err(parse_err)?;
    compiler.open_file(path).map_err(parse_err)?;
    Ok(compiler.descriptor_pool())
}

fn method_entry(
    package: &str,
    service: &str,
    method: &MethodDescriptor,
    source: &Path,
) -> MethodEntry {
    MethodEntry {
        key: MethodKey::new(package, service, method.name()),
        input: method.input(),
        output: method.output(),
        client_streaming: method.is_client_streaming(),
        server_streaming: method.is_server_streaming(),
        source: source.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SHOP: &str = r#"
syntax = "proto3";
package shop.v1;

message GetOrderRequest { string id = 1; }
message Order { string id = 1; int32 quantity = 2; }

service Orders {
  rpc GetOrder(GetOrderRequest) returns (Order);
  rpc WatchOrders(GetOrderRequest) returns (stream Order);
}
"#;

    const USERS: &str = r#"
syntax = "proto3";
package users;

import "google/protobuf/empty.proto";

message User { string name = 1; }

service Directory {
  rpc Me(google.protobuf.Empty) returns (User);
  rpc Ping(google.protobuf.Empty) returns (google.protobuf.Empty);
}

service Admin {}
"#;

    fn write(dir: &TempDir, name: &str, body: &str) {
        fs::write(dir.path().join(name), body).unwrap();
    }

    #[test]
    fn disjoint_files_merge_into_one_catalog() {
        let dir = TempDir::new().unwrap();
        write(&dir, "shop.proto", SHOP);
        write(&dir, "users.proto", USERS);

        let catalog = load(dir.path()).unwrap();

        let paths: Vec<String> = catalog.keys().iter().map(MethodKey::path).collect();
        assert_eq!(
            paths,
            vec![
                "/shop.v1.Orders/GetOrder",
                "/shop.v1.Orders/WatchOrders",
                "/users.Directory/Me",
                "/users.Directory/Ping",
            ]
        );
        assert_eq!(catalog.service_count(), 3);

        let get = catalog
            .get(&MethodKey::new("shop.v1", "Orders", "GetOrder"))
            .unwrap();
        assert!(get.is_unary());
        assert_eq!(get.output.full_name(), "shop.v1.Order");

        let watch = catalog
            .get(&MethodKey::new("shop.v1", "Orders", "WatchOrders"))
            .unwrap();
        assert!(watch.server_streaming);
    }

    #[test]
    fn empty_service_is_kept_for_the_binder() {
        let dir = TempDir::new().unwrap();
        write(&dir, "users.proto", USERS);

        let catalog = load(dir.path()).unwrap();
        let admin = &catalog.packages()["users"].services["Admin"];
        assert!(admin.methods.is_empty());
    }

    #[test]
    fn package_without_services_is_kept() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "types.proto",
            "syntax = \"proto3\";\npackage common;\nmessage Money { int64 cents = 1; }\n",
        );

        let catalog = load(dir.path()).unwrap();
        assert!(catalog.packages()["common"].services.is_empty());
        assert_eq!(catalog.method_count(), 0);
    }

    #[test]
    fn non_proto_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        write(&dir, "shop.proto", SHOP);
        write(&dir, "README.md", "not a proto");
        write(&dir, "shop.proto.bak", "garbage {");
        fs::create_dir(dir.path().join("nested.proto")).unwrap();

        let catalog = load(dir.path()).unwrap();
        assert_eq!(catalog.method_count(), 2);
    }

    #[test]
    fn imports_between_sibling_files_resolve() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "common.proto",
            "syntax = \"proto3\";\npackage common;\nmessage Id { string value = 1; }\n",
        );
        write(
            &dir,
            "lookup.proto",
            r#"
syntax = "proto3";
package lookup;
import "common.proto";
service Lookup { rpc Find(common.Id) returns (common.Id); }
"#,
        );

        let catalog = load(dir.path()).unwrap();
        let find = catalog
            .get(&MethodKey::new("lookup", "Lookup", "Find"))
            .unwrap();
        assert_eq!(find.input.full_name(), "common.Id");
        assert!(catalog.packages()["common"].services.is_empty());
    }

    #[test]
    fn duplicate_method_across_files_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.proto", SHOP);
        write(&dir, "b.proto", SHOP);

        let err = load(dir.path()).unwrap_err();
        match err {
            RegistryError::DuplicateMethod { key, first, second } => {
                assert_eq!(key, MethodKey::new("shop.v1", "Orders", "GetOrder"));
                assert!(first.ends_with("a.proto"));
                assert!(second.ends_with("b.proto"));
            }
            other => panic!("expected DuplicateMethod, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_the_file_that_declared_the_method() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "a.proto",
            "syntax = \"proto3\";\npackage p;\nmessage M {}\nservice S { rpc One(M) returns (M); }\n",
        );
        write(
            &dir,
            "b.proto",
            "syntax = \"proto3\";\npackage p;\nmessage N {}\nservice S { rpc Two(N) returns (N); }\n",
        );
        write(
            &dir,
            "c.proto",
            "syntax = \"proto3\";\npackage p;\nmessage O {}\nservice S { rpc Two(O) returns (O); }\n",
        );

        let err = load(dir.path()).unwrap_err();
        match err {
            RegistryError::DuplicateMethod { key, first, second } => {
                assert_eq!(key, MethodKey::new("p", "S", "Two"));
                assert!(first.ends_with("b.proto"), "first = {}", first.display());
                assert!(second.ends_with("c.proto"), "second = {}", second.display());
            }
            other => panic!("expected DuplicateMethod, got {other:?}"),
        }
    }

    #[test]
    fn methods_remember_their_source_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "shop.proto", SHOP);
        write(&dir, "users.proto", USERS);

        let catalog = load(dir.path()).unwrap();
        let me = catalog.get(&MethodKey::new("users", "Directory", "Me")).unwrap();
        assert!(me.source.ends_with("users.proto"));
    }

    #[test]
    fn empty_directory_loads_an_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = load(dir.path()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.method_count(), 0);
    }

    #[test]
    fn malformed_file_is_fatal_and_named() {
        let dir = TempDir::new().unwrap();
        write(&dir, "shop.proto", SHOP);
        write(&dir, "broken.proto", "syntax = \"proto3\";\nservice {");

        let err = load(dir.path()).unwrap_err();
        match &err {
            RegistryError::Parse { file, .. } => assert!(file.ends_with("broken.proto")),
            other => panic!("expected Parse, got {other:?}"),
        }
        assert!(err.to_string().contains("broken.proto"));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, RegistryError::Directory { .. }));
    }

    #[test]
    fn loading_twice_yields_identical_catalogs() {
        let dir = TempDir::new().unwrap();
        write(&dir, "shop.proto", SHOP);
        write(&dir, "users.proto", USERS);

        let first = load(dir.path()).unwrap();
        let second = load(dir.path()).unwrap();
        assert_eq!(first.keys(), second.keys());
        assert_eq!(first.service_count(), second.service_count());
    }
}
