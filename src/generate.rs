//! One generation run: validate the interface, synthesize entry methods and
//! helpers, collect imports, assemble the unit.
use serde::Serialize;

use crate::emit::{self, UnitParts};
use crate::error::{GenerateError, ResolveError};
use crate::imports::{DEFAULT_IMPORT_DENYLIST, collect_imports};
use crate::resolve::CatalogResolver;
use crate::shape::{InterfaceDescriptor, ShapeTable, package_alias};
use crate::synth::{GenerationContext, UnresolvedField};

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Package paths left out of the import block.
    pub import_denylist: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            import_denylist: DEFAULT_IMPORT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// `<interface lowercase>_mapper.go`
    pub file_name: String,
    /// Package the unit belongs to; where it should be written.
    pub package: String,
    pub source: String,
    pub report: GenerationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub interface: String,
    pub package: String,
    pub methods: Vec<String>,
    pub helpers: Vec<HelperSummary>,
    pub imports: Vec<String>,
    pub unresolved: Vec<UnresolvedField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelperSummary {
    pub name: String,
    pub source: String,
    pub target: String,
}

/// Check the interface before anything is generated.
pub fn validate_interface(iface: &InterfaceDescriptor) -> Result<(), GenerateError> {
    if iface.name.is_empty() {
        return Err(GenerateError::UnnamedInterface);
    }
    if iface.methods.is_empty() {
        return Err(GenerateError::InvalidInterfaceShape(format!(
            "interface {} declares no methods",
            iface.name
        )));
    }
    for m in &iface.methods {
        if m.params.len() != 1 || m.results.len() != 1 {
            return Err(GenerateError::InvalidInterfaceShape(format!(
                "method {}.{} must have one input parameter and one output parameter, has {} and {}",
                iface.name,
                m.name,
                m.params.len(),
                m.results.len()
            )));
        }
    }
    Ok(())
}

pub fn generate(
    table: &ShapeTable,
    iface: &InterfaceDescriptor,
    options: &GenerateOptions,
) -> Result<GeneratedUnit, GenerateError> {
    validate_interface(iface)?;
    let _span = tracing::info_span!("generate", interface = %iface.name).entered();

    let receiver = emit::receiver_name(&iface.name);
    let mut ctx =
        GenerationContext::new(table, &iface.package, &receiver).with_import_denylist(&options.import_denylist);
    let methods = iface
        .methods
        .iter()
        .map(|m| {
            tracing::debug!(method = %m.name, "synthesizing entry method");
            ctx.entry_function(m)
        })
        .collect::<Vec<_>>();

    let imports = collect_imports(table, iface, &options.import_denylist);
    let source = emit::assemble(&UnitParts {
        package_name: package_alias(&iface.package),
        interface: &iface.name,
        receiver: &receiver,
        imports: &imports,
        methods: &methods,
        helpers: ctx.registry.bodies().collect(),
    });
    tracing::debug!(helpers = ctx.registry.len(), unresolved = ctx.unresolved.len(), "generated unit");

    let report = GenerationReport {
        interface: iface.name.clone(),
        package: iface.package.clone(),
        methods: iface.methods.iter().map(|m| m.name.clone()).collect(),
        helpers: ctx
            .registry
            .entries()
            .iter()
            .map(|e| HelperSummary {
                name: e.name.clone(),
                source: e.key.source.clone(),
                target: e.key.target.clone(),
            })
            .collect(),
        imports: imports.into_iter().collect(),
        unresolved: ctx.unresolved,
    };
    Ok(GeneratedUnit {
        file_name: format!("{}_mapper.go", iface.name.to_lowercase()),
        package: iface.package.clone(),
        source,
        report,
    })
}

/// Parse a descriptor catalog, resolve its root interface and generate.
pub fn generate_from_json(src: &str, options: &GenerateOptions) -> Result<GeneratedUnit, ResolveError> {
    let mut resolver = CatalogResolver::from_json(src)?;
    let iface = resolver.resolve_root()?;
    let table = resolver.into_table();
    Ok(generate(&table, &iface, options)?)
}
