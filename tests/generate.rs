//! End-to-end generation from descriptor catalogs.
use stos::locate::{ModuleLocator, PackageLocator, write_unit};
use stos::{GenerateError, GenerateOptions, ResolveError, generate_from_json};

// ── Helpers ────────────────────────────────────────────────────────────

const MAPPER_USER: &str = include_str!("fixtures/mapper_user.json");
const MAPPER_USER_GO: &str = include_str!("fixtures/mapper_user.go");

fn generate(src: &str) -> stos::GeneratedUnit {
    generate_from_json(src, &GenerateOptions::default()).unwrap()
}

/// Catalog with one interface in `example.com/app/mapper` and the given
/// source/target packages. `methods` and the struct maps are raw JSON.
fn catalog(methods: &str, source: &str, target: &str) -> String {
    format!(
        r#"{{
            "root": "example.com/app/mapper.Mapper",
            "packages": {{
                "example.com/app/mapper": {{ "Mapper": {{ "kind": "interface", "methods": [{methods}] }} }},
                "example.com/app/source": {{ {source} }},
                "example.com/app/target": {{ {target} }}
            }}
        }}"#
    )
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn user_example_matches_golden_output() {
    let unit = generate(MAPPER_USER);
    assert_eq!(unit.source, MAPPER_USER_GO);
    assert_eq!(unit.file_name, "mapperuser_mapper.go");
    assert_eq!(unit.package, "github.com/alterasi/stos/example/mapper");
    assert_eq!(unit.report.helpers.len(), 1);
    assert!(unit.report.unresolved.is_empty());
    // time is reachable through Birthday but denylisted
    assert!(!unit.report.imports.iter().any(|i| i == "time"));
}

#[test]
fn name_role_children_scenario() {
    let src = catalog(
        r#"{ "name": "ToDTO", "params": ["example.com/app/source.Parent"], "results": ["example.com/app/target.Parent"] }"#,
        r#"
        "Role": { "kind": "named", "underlying": "string" },
        "Child": { "kind": "struct", "fields": [ { "name": "Name", "type": "string" } ] },
        "Parent": { "kind": "struct", "fields": [
            { "name": "Name", "type": "string" },
            { "name": "Role", "type": "*example.com/app/source.Role" },
            { "name": "Children", "type": "[]*example.com/app/source.Child" }
        ] }"#,
        r#"
        "Child": { "kind": "struct", "fields": [ { "name": "Name", "type": "string" } ] },
        "Parent": { "kind": "struct", "fields": [
            { "name": "Name", "type": "string" },
            { "name": "Role", "type": "example.com/app/source.Role" },
            { "name": "Children", "type": "[]example.com/app/target.Child" }
        ] }"#,
    );
    let unit = generate(&src);
    let go = &unit.source;

    assert!(go.contains("\tobjTarget.Name = objSource.Name\n"));
    assert!(go.contains("\tif objSource.Role != nil {\n\t\tobjTarget.Role = *objSource.Role\n\t} else {\n\t\tvar zeroValue source.Role\n"));
    assert!(go.contains("\tif len(objSource.Children) > 0 {\n"));
    assert!(go.contains("\t\t\tif v != nil {\n\t\t\t\tobjTarget.Children[i] = impl.mapChildToChild(*v)\n\t\t\t}\n"));
    assert_eq!(count(go, "func (impl *mapperImpl) mapChildToChild("), 1);
}

#[test]
fn repeated_struct_pairs_share_one_helper() {
    let child = r#""Child": { "kind": "struct", "fields": [ { "name": "Name", "type": "string" } ] }"#;
    let src = catalog(
        r#"
        { "name": "One", "params": ["example.com/app/source.Child"], "results": ["*example.com/app/target.Child"] },
        { "name": "Many", "params": ["[]example.com/app/source.Child"], "results": ["[]*example.com/app/target.Child"] },
        { "name": "Maybe", "params": ["*example.com/app/source.Child"], "results": ["example.com/app/target.Child"] }"#,
        child,
        child,
    );
    let unit = generate(&src);
    assert_eq!(count(&unit.source, "func (impl *mapperImpl) mapChildToChild("), 1);
    assert_eq!(count(&unit.source, "impl.mapChildToChild("), 3);
    assert_eq!(unit.report.methods, ["One", "Many", "Maybe"]);

    // entry methods in interface order, helpers after them
    let one = unit.source.find(") One(").unwrap();
    let many = unit.source.find(") Many(").unwrap();
    let maybe = unit.source.find(") Maybe(").unwrap();
    let helper = unit.source.find(") mapChildToChild(").unwrap();
    assert!(one < many && many < maybe && maybe < helper);
}

#[test]
fn slice_entry_method_is_length_guarded() {
    let child = r#""Child": { "kind": "struct", "fields": [ { "name": "Name", "type": "string" } ] }"#;
    let src = catalog(
        r#"{ "name": "All", "params": ["[]*example.com/app/source.Child"], "results": ["[]*example.com/app/target.Child"] }"#,
        child,
        child,
    );
    let unit = generate(&src);
    assert!(unit.source.contains(
        "func (impl *mapperImpl) All(objSource []*source.Child) []*target.Child {\n\
         \tvar objTarget []*target.Child\n\
         \tif len(objSource) > 0 {\n\
         \t\tobjTarget = make([]*target.Child, len(objSource))\n\
         \t\tfor i, v := range objSource {\n\
         \t\t\tif v != nil {\n\
         \t\t\t\tmapped := impl.mapChildToChild(*v)\n\
         \t\t\t\tobjTarget[i] = &mapped\n\
         \t\t\t}\n\
         \t\t}\n\
         \t}\n\
         \treturn objTarget\n\
         }\n"
    ));
}

#[test]
fn self_referential_structs_terminate() {
    let node = |pkg: &str| {
        format!(
            r#""Node": {{ "kind": "struct", "fields": [
                {{ "name": "Value", "type": "int" }},
                {{ "name": "Parent", "type": "*example.com/app/{pkg}.Node" }},
                {{ "name": "Children", "type": "[]example.com/app/{pkg}.Node" }}
            ] }}"#
        )
    };
    let src = catalog(
        r#"{ "name": "Tree", "params": ["example.com/app/source.Node"], "results": ["example.com/app/target.Node"] }"#,
        &node("source"),
        &node("target"),
    );
    let unit = generate(&src);
    assert_eq!(unit.report.helpers.len(), 1);
    assert_eq!(unit.report.helpers[0].name, "mapNodeToNode");
    assert_eq!(count(&unit.source, "func (impl *mapperImpl) mapNodeToNode("), 1);
}

#[test]
fn unresolved_fields_are_marked_not_fatal() {
    let src = catalog(
        r#"{ "name": "Convert", "params": ["example.com/app/source.User"], "results": ["example.com/app/target.User"] }"#,
        r#""User": { "kind": "struct", "fields": [
            { "name": "Age", "type": "string" },
            { "name": "Tags", "type": "[]int" }
        ] }"#,
        r#""User": { "kind": "struct", "fields": [
            { "name": "Age", "type": "int" },
            { "name": "Tags", "type": "[]string" }
        ] }"#,
    );
    let unit = generate(&src);
    assert!(unit.source.contains("\t// TODO: map Age manually (string -> int)\n"));
    assert!(unit.source.contains("\t// TODO: map Tags manually ([]int -> []string)\n"));
    let fields: Vec<_> = unit.report.unresolved.iter().map(|u| u.field.as_str()).collect();
    assert_eq!(fields, ["Age", "Tags"]);
    assert!(unit.report.unresolved.iter().all(|u| u.function == "Convert"));
}

#[test]
fn opaque_named_and_interface_fields_copy_directly() {
    let src = catalog(
        r#"{ "name": "Convert", "params": ["example.com/app/source.User"], "results": ["example.com/app/target.User"] }"#,
        r#"
        "Tags": { "kind": "named", "underlying": "[]string" },
        "Meta": { "kind": "named", "underlying": "map[string]string" },
        "Ids": { "kind": "named", "underlying": "[]int" },
        "Shape": { "kind": "interface", "methods": [ { "name": "Area", "results": ["float64"] } ] },
        "User": { "kind": "struct", "fields": [
            { "name": "Tags", "type": "example.com/app/source.Tags" },
            { "name": "Meta", "type": "*example.com/app/source.Meta" },
            { "name": "Shape", "type": "example.com/app/source.Shape" },
            { "name": "Ids", "type": "example.com/app/source.Ids" }
        ] }"#,
        r#"
        "Ids": { "kind": "named", "underlying": "[]int" },
        "User": { "kind": "struct", "fields": [
            { "name": "Tags", "type": "example.com/app/source.Tags" },
            { "name": "Meta", "type": "*example.com/app/source.Meta" },
            { "name": "Shape", "type": "example.com/app/source.Shape" },
            { "name": "Ids", "type": "example.com/app/target.Ids" }
        ] }"#,
    );
    let unit = generate(&src);
    assert!(unit.source.contains("\tobjTarget.Tags = objSource.Tags\n"));
    assert!(unit.source.contains("\tobjTarget.Meta = objSource.Meta\n"));
    assert!(unit.source.contains("\tobjTarget.Shape = objSource.Shape\n"));
    assert!(unit.source.contains("\t// TODO: map Ids manually (source.Ids -> target.Ids)\n"));
    assert_eq!(unit.report.unresolved.len(), 1);
}

#[test]
fn named_type_cycle_is_an_error() {
    let src = catalog(
        r#"{ "name": "Convert", "params": ["example.com/app/source.User"], "results": ["example.com/app/target.User"] }"#,
        r#"
        "A": { "kind": "named", "underlying": "example.com/app/source.B" },
        "B": { "kind": "named", "underlying": "example.com/app/source.A" },
        "User": { "kind": "struct", "fields": [ { "name": "X", "type": "example.com/app/source.A" } ] }"#,
        r#""User": { "kind": "struct" }"#,
    );
    let err = generate_from_json(&src, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, ResolveError::CyclicNamedType(_)), "{err}");
}

#[test]
fn method_without_output_fails_before_output() {
    let src = catalog(
        r#"{ "name": "Convert", "params": ["example.com/app/source.User"] }"#,
        r#""User": { "kind": "struct" }"#,
        r#""User": { "kind": "struct" }"#,
    );
    let err = generate_from_json(&src, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, ResolveError::Generate(GenerateError::InvalidInterfaceShape(_))), "{err}");
}

#[test]
fn root_must_be_an_interface() {
    let src = r#"{
        "root": "example.com/app/source.User",
        "packages": { "example.com/app/source": { "User": { "kind": "struct" } } }
    }"#;
    let err = generate_from_json(src, &GenerateOptions::default()).unwrap_err();
    assert!(matches!(err, ResolveError::Generate(GenerateError::InvalidInterfaceShape(_))), "{err}");
}

#[test]
fn denylist_can_be_replaced() {
    let options = GenerateOptions { import_denylist: vec!["github.com/alterasi/stos/example/target".into()] };
    let unit = generate_from_json(MAPPER_USER, &options).unwrap();
    assert_eq!(unit.report.imports, ["github.com/alterasi/stos/example/source", "time"]);
    assert!(unit.source.contains("import (\n\t\"github.com/alterasi/stos/example/source\"\n\t\"time\"\n)\n"));
}

#[test]
fn output_is_deterministic() {
    let first = generate(MAPPER_USER).source;
    for _ in 0..5 {
        assert_eq!(generate(MAPPER_USER).source, first);
    }
}

// ── Collaborators ──────────────────────────────────────────────────────

#[test]
fn writes_unit_into_located_package_dir() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("go.mod"), "module github.com/alterasi/stos\n").unwrap();
    let unit = generate(MAPPER_USER);

    let locator = ModuleLocator::from_go_mod(root.path()).unwrap();
    let dir = locator.locate(&unit.package).unwrap();
    let path = write_unit(&unit, &dir).unwrap();

    assert_eq!(path, root.path().join("example/mapper/mapperuser_mapper.go"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), MAPPER_USER_GO);
}
