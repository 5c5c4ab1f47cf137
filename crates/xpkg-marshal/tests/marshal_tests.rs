//! End-to-end marshaling tests over on-disk and in-memory packages

use std::path::Path;
use tempfile::TempDir;
use xpkg_core::{GroupVersionKind, PackageType};
use xpkg_marshal::{
    ErrorKind, Layer, LayeredImage, Marshaler, MemFs, OsFs, derive_package_name,
};
use xpkg_schema::DuplicatePolicy;

const PROVIDER_META: &str = r#"apiVersion: meta.pkg.crossplane.io/v1
kind: Provider
metadata:
  name: provider-widgets
spec:
  controller:
    image: example/provider-widgets-controller:v0.3.0
  crossplane:
    version: ">=v1.2.0"
  dependsOn:
    - provider: xpkg.upbound.io/example/provider-base
      version: ">=v0.1.0"
    - configuration: xpkg.upbound.io/example/platform-base
      version: "v1.0.0"
"#;

const CONFIGURATION_META: &str = r#"apiVersion: meta.pkg.crossplane.io/v1alpha1
kind: Configuration
metadata:
  name: platform-config
spec:
  dependsOn:
    - provider: xpkg.upbound.io/example/provider-widgets
      version: ">=v0.3.0"
"#;

const WIDGET_CRD: &str = r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.org
spec:
  group: example.org
  scope: Cluster
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          required: [spec]
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: integer
                  minimum: 1
"#;

/// Legacy CRD whose top-level schema requires `region`, while every
/// per-version schema requires `zone` instead
const GADGET_LEGACY_CRD: &str = r#"apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: gadgets.example.org
spec:
  group: example.org
  names:
    kind: Gadget
    plural: gadgets
  validation:
    openAPIV3Schema:
      type: object
      properties:
        spec:
          type: object
          required: [region]
  versions:
    - name: v1alpha1
      served: true
      storage: false
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [zone]
    - name: v1beta1
      served: true
      storage: false
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [zone]
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [zone]
"#;

const DATABASE_XRD: &str = r#"apiVersion: apiextensions.crossplane.io/v1
kind: CompositeResourceDefinition
metadata:
  name: xdatabases.platform.example.org
spec:
  group: platform.example.org
  names:
    kind: XDatabase
    plural: xdatabases
  claimNames:
    kind: Database
    plural: databases
  versions:
    - name: v1alpha1
      served: true
      referenceable: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [engine]
              properties:
                engine:
                  type: string
                  enum: [postgres, mysql]
"#;

const COMPOSITION: &str = r#"apiVersion: apiextensions.crossplane.io/v1
kind: Composition
metadata:
  name: xdatabases-aws
spec:
  compositeTypeRef:
    apiVersion: platform.example.org/v1alpha1
    kind: XDatabase
"#;

const DIGEST: &str = "sha256:3b0c2f8f6e4b1a52c63fd2e3c6a1b8f3d1c0a9e8f7b6c5d4e3f2a1b0c9d8e7f6";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Create `<tmp>/<name>@<version>` with the given files
fn package_dir(name: &str, files: &[(&str, &str)]) -> (TempDir, String) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(name);
    for (rel, content) in files {
        write(&dir, rel, content);
    }
    let path = dir.to_string_lossy().into_owned();
    (tmp, path)
}

fn tar(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

mod from_dir {
    use super::*;

    #[test]
    fn test_provider_package() {
        let (_tmp, path) = package_dir(
            "provider-widgets@v0.3.0",
            &[
                ("crossplane.yaml", PROVIDER_META),
                ("crds/gadgets.yaml", GADGET_LEGACY_CRD),
                ("crds/widgets.yaml", WIDGET_CRD),
                (DIGEST, ""),
            ],
        );

        let pkg = Marshaler::new()
            .from_dir(&OsFs, &path, "xpkg.upbound.io", "example/provider-widgets")
            .unwrap();

        assert_eq!(pkg.package_type(), PackageType::Provider);
        assert_eq!(pkg.name(), "xpkg.upbound.io/example/provider-widgets");
        assert_eq!(pkg.version(), "v0.3.0");
        assert_eq!(pkg.digest(), DIGEST);
        assert_eq!(pkg.meta().name(), "provider-widgets");
        assert_eq!(pkg.objects().len(), 2);

        let deps = pkg.dependencies();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].package, "xpkg.upbound.io/example/provider-base");
        assert_eq!(deps[0].package_type, PackageType::Provider);
        assert_eq!(deps[1].package_type, PackageType::Configuration);
        assert_eq!(deps[1].constraints, "v1.0.0");

        // 3 legacy gadget versions + 1 widget version
        assert_eq!(pkg.validators().len(), 4);
    }

    #[test]
    fn test_legacy_top_level_schema_wins_over_version_schemas() {
        let (_tmp, path) = package_dir(
            "provider-widgets@v0.3.0",
            &[("crossplane.yaml", PROVIDER_META), ("crd.yaml", GADGET_LEGACY_CRD)],
        );

        let pkg = Marshaler::new()
            .from_dir(&OsFs, &path, "index.docker.io", "example/provider-widgets")
            .unwrap();

        let index = pkg.validators();
        assert_eq!(index.len(), 3);
        for version in ["v1alpha1", "v1beta1", "v1"] {
            let gvk = GroupVersionKind::new("example.org", version, "Gadget");
            let validator = index.get(&gvk).unwrap();
            assert!(validator.is_valid(&serde_json::json!({ "spec": { "region": "eu" } })));
            assert!(!validator.is_valid(&serde_json::json!({ "spec": { "zone": "a" } })));
        }
    }

    #[test]
    fn test_legacy_crd_without_any_schema() {
        let crd = r#"apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: gadgets.example.org
spec:
  group: example.org
  version: v1alpha1
  names:
    kind: Gadget
    plural: gadgets
"#;
        let (_tmp, path) = package_dir(
            "provider-widgets@v0.3.0",
            &[("crossplane.yaml", PROVIDER_META), ("crd.yaml", crd)],
        );

        let pkg = Marshaler::new()
            .from_dir(&OsFs, &path, "index.docker.io", "example/provider-widgets")
            .unwrap();

        let index = pkg.validators();
        assert_eq!(index.len(), 1);
        let gvk = GroupVersionKind::new("example.org", "v1alpha1", "Gadget");
        let validator = index.get(&gvk).unwrap();
        assert!(validator.is_valid(&serde_json::json!({ "spec": { "whatever": true } })));
        assert!(validator.is_valid(&serde_json::json!("scalar")));
    }

    #[test]
    fn test_configuration_package() {
        let (_tmp, path) = package_dir(
            "platform-config@v1.2.3",
            &[
                ("crossplane.yaml", CONFIGURATION_META),
                ("apis/xdatabase/definition.yaml", DATABASE_XRD),
            ],
        );

        let pkg = Marshaler::new()
            .from_dir(&OsFs, &path, "index.docker.io", "example/platform-config")
            .unwrap();

        assert_eq!(pkg.package_type(), PackageType::Configuration);
        assert_eq!(pkg.name(), "example/platform-config");
        assert_eq!(pkg.version(), "v1.2.3");
        assert_eq!(pkg.digest(), "");

        let gvk = GroupVersionKind::new("platform.example.org", "v1alpha1", "XDatabase");
        let validator = pkg.validators().get(&gvk).unwrap();

        let valid = serde_json::json!({ "spec": { "engine": "postgres" } });
        assert!(validator.validate(&valid).is_valid);

        let missing = serde_json::json!({ "spec": {} });
        let result = validator.validate(&missing);
        assert!(!result.is_valid);
        assert!(result.errors[0].message.contains("engine"));
    }

    #[test]
    fn test_composition_passes_lint_but_has_no_schema() {
        let (_tmp, path) = package_dir(
            "platform-config@v1.2.3",
            &[
                ("crossplane.yaml", CONFIGURATION_META),
                ("apis/definition.yaml", DATABASE_XRD),
                ("apis/composition.yaml", COMPOSITION),
            ],
        );

        let err = Marshaler::new()
            .from_dir(&OsFs, &path, "index.docker.io", "example/platform-config")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownObjectType);
    }

    #[test]
    fn test_invalid_path() {
        let fs = MemFs::new();
        for path in ["/pkgs/provider", "/pkgs/a@b@c"] {
            let err = Marshaler::new()
                .from_dir(&fs, path, "index.docker.io", "repo")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInputPath, "{path}");
        }
    }

    #[test]
    fn test_version_from_path() {
        let fs = MemFs::new()
            .with_file("foo@v1.2.3/crossplane.yaml", PROVIDER_META)
            .with_file("foo@v1.2.3/crd.yaml", WIDGET_CRD);

        let pkg = Marshaler::new()
            .from_dir(&fs, "foo@v1.2.3", "index.docker.io", "foo")
            .unwrap();
        assert_eq!(pkg.version(), "v1.2.3");
        assert_eq!(pkg.name(), "foo");
    }

    #[test]
    fn test_zero_meta_objects() {
        let fs = MemFs::new().with_file("/p@v1/crd.yaml", WIDGET_CRD);
        let err = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExactlyOneMeta);
    }

    #[test]
    fn test_two_meta_objects() {
        let fs = MemFs::new()
            .with_file("/p@v1/a.yaml", PROVIDER_META)
            .with_file("/p@v1/b.yaml", CONFIGURATION_META)
            .with_file("/p@v1/crd.yaml", WIDGET_CRD);
        let err = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExactlyOneMeta);
    }

    #[test]
    fn test_provider_with_xrd_fails_lint() {
        let fs = MemFs::new()
            .with_file("/p@v1/crossplane.yaml", PROVIDER_META)
            .with_file("/p@v1/xrd.yaml", DATABASE_XRD);
        let err = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LintFailure);
    }

    #[test]
    fn test_unknown_body_object() {
        let fs = MemFs::new()
            .with_file("/p@v1/crossplane.yaml", CONFIGURATION_META)
            .with_file("/p@v1/xrd.yaml", DATABASE_XRD)
            .with_file("/p@v1/zz.yaml", COMPOSITION);
        let err = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownObjectType);
    }

    #[test]
    fn test_dependency_with_both_references_fails_to_parse() {
        let meta = r#"apiVersion: meta.pkg.crossplane.io/v1
kind: Configuration
metadata:
  name: ambiguous
spec:
  dependsOn:
    - provider: example/provider-a
      configuration: example/config-b
      version: v1.0.0
"#;
        let fs = MemFs::new().with_file("/p@v1/crossplane.yaml", meta);
        let err = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }

    #[test]
    fn test_strict_classification() {
        let meta = "apiVersion: meta.pkg.crossplane.io/v1beta1\nkind: Function\nmetadata:\n  name: fn\n";
        let fs = MemFs::new().with_file("/p@v1/crossplane.yaml", meta);

        let lenient = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(lenient.kind(), ErrorKind::LintFailure);

        let strict = Marshaler::builder()
            .classification(xpkg_core::ClassificationMode::Strict)
            .build()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(strict.kind(), ErrorKind::UnknownMetaKind);
    }

    #[test]
    fn test_duplicate_policies() {
        let fs = MemFs::new()
            .with_file("/p@v1/crossplane.yaml", PROVIDER_META)
            .with_file("/p@v1/a.yaml", WIDGET_CRD)
            .with_file("/p@v1/b.yaml", WIDGET_CRD.replace("minimum: 1", "minimum: 10"));

        let pkg = Marshaler::new()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap();
        let gvk = GroupVersionKind::new("example.org", "v1alpha1", "Widget");
        let doc = serde_json::json!({ "spec": { "size": 5 } });
        assert!(!pkg.validators().get(&gvk).unwrap().is_valid(&doc));

        let err = Marshaler::builder()
            .duplicate_schemas(DuplicatePolicy::Reject)
            .build()
            .from_dir(&fs, "/p@v1", "index.docker.io", "p")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConflictingSchema);
    }

    #[test]
    fn test_default_registry_from_config() {
        let fs = MemFs::new()
            .with_file("/p@v1/crossplane.yaml", PROVIDER_META)
            .with_file("/p@v1/crd.yaml", WIDGET_CRD);
        let pkg = Marshaler::builder()
            .default_registry("registry.example.com")
            .build()
            .from_dir_default_registry(&fs, "/p@v1", "team/p")
            .unwrap();
        assert_eq!(pkg.name(), "registry.example.com/team/p");
        assert_eq!(pkg.registry(), "registry.example.com");
    }
}

mod from_image {
    use super::*;

    fn stream() -> String {
        format!("{}---\n{}", PROVIDER_META, WIDGET_CRD)
    }

    #[test]
    fn test_provider_image() {
        let stream = stream();
        let layers = vec![
            Layer::new("base", tar(&[("package.yaml", "stale"), ("README", "x")])),
            Layer::new("pkg", tar(&[("package.yaml", stream.as_str())])),
        ];
        let manifest = br#"{"schemaVersion":2}"#;
        let image = LayeredImage::new(manifest, layers);

        let pkg = Marshaler::new()
            .from_image("index.docker.io", "example/provider-widgets", "v0.3.0", &image)
            .unwrap();

        assert_eq!(pkg.name(), "example/provider-widgets");
        assert_eq!(pkg.version(), "v0.3.0");
        assert_eq!(pkg.digest(), xpkg_marshal::image::sha256_digest(manifest));
        assert_eq!(pkg.package_type(), PackageType::Provider);
        assert_eq!(pkg.validators().len(), 1);
    }

    #[test]
    fn test_image_without_digest() {
        let image = LayeredImage::from_layers(vec![Layer::new(
            "pkg",
            tar(&[("package.yaml", stream().as_str())]),
        )]);
        let err = Marshaler::new()
            .from_image("index.docker.io", "p", "v1", &image)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DigestUnavailable);
    }

    #[test]
    fn test_image_without_package_stream() {
        let image = LayeredImage::new(b"m", vec![Layer::new("pkg", tar(&[("other.yaml", "x")]))]);
        let err = Marshaler::new()
            .from_image("index.docker.io", "p", "v1", &image)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_stream_deleted_by_whiteout() {
        let image = LayeredImage::new(
            b"m",
            vec![
                Layer::new("base", tar(&[("package.yaml", stream().as_str())])),
                Layer::new("top", tar(&[(".wh.package.yaml", "")])),
            ],
        );
        let err = Marshaler::new()
            .from_image("index.docker.io", "p", "v1", &image)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

#[test]
fn test_derive_package_name() {
    assert_eq!(derive_package_name("index.docker.io", "myrepo"), "myrepo");
    assert_eq!(
        derive_package_name("xpkg.upbound.io", "myrepo"),
        "xpkg.upbound.io/myrepo"
    );
}

#[test]
fn test_marshaler_shared_across_threads() {
    let marshaler = std::sync::Arc::new(Marshaler::new());
    let fs = std::sync::Arc::new(
        MemFs::new()
            .with_file("/p@v1/crossplane.yaml", PROVIDER_META)
            .with_file("/p@v1/crd.yaml", WIDGET_CRD),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let marshaler = marshaler.clone();
            let fs = fs.clone();
            std::thread::spawn(move || {
                marshaler
                    .from_dir(fs.as_ref(), "/p@v1", "index.docker.io", &format!("repo-{i}"))
                    .map(|pkg| pkg.name().to_string())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap().unwrap(), format!("repo-{i}"));
    }
}
