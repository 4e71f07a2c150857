//! Output assembly: a small indentation-aware text writer and the function
//! that stitches header, imports, wrapper type, constructor, entry methods and
//! helpers into one Go file.
use std::collections::BTreeSet;
use std::fmt::Write as _;

// ————————————————————————————————————————————————————————————————————————————
// WRITER
// ————————————————————————————————————————————————————————————————————————————

/// Line-oriented Go writer. Indents with tabs, gofmt style.
#[derive(Debug, Default)]
pub struct GoWriter {
    buf: String,
    depth: usize,
}

impl GoWriter {
    pub fn new() -> Self { Self::default() }

    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.buf.push('\t');
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    /// Write `text` and indent everything after it.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    /// Dedent, then write `text`.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    /// `} else {` style: dedent, write, indent again.
    pub fn reopen(&mut self, text: impl AsRef<str>) {
        self.close(text);
        self.depth += 1;
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

// ————————————————————————————————————————————————————————————————————————————
// UNIT
// ————————————————————————————————————————————————————————————————————————————

pub struct UnitParts<'a> {
    pub package_name: &'a str,
    pub interface: &'a str,
    pub receiver: &'a str,
    pub imports: &'a BTreeSet<String>,
    /// One function per interface method, in declaration order.
    pub methods: &'a [String],
    /// Helper functions in registration order.
    pub helpers: Vec<&'a str>,
}

/// Pure concatenation; no function text is rewritten.
pub fn assemble(parts: &UnitParts<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Code generated by stos for {}.", parts.interface);
    let _ = writeln!(out, "// Fields marked TODO could not be mapped automatically.\n");
    let _ = writeln!(out, "package {}\n", parts.package_name);

    if !parts.imports.is_empty() {
        out.push_str("import (\n");
        for pkg in parts.imports {
            let _ = writeln!(out, "\t\"{pkg}\"");
        }
        out.push_str(")\n\n");
    }

    let _ = writeln!(out, "type {} struct{{}}\n", parts.receiver);
    out.push_str(&constructor(parts.interface, parts.receiver));

    for f in parts.methods.iter().map(String::as_str).chain(parts.helpers.iter().copied()) {
        out.push('\n');
        out.push_str(f);
    }
    out
}

fn constructor(interface: &str, receiver: &str) -> String {
    let mut w = GoWriter::new();
    w.open(format!("func New{interface}Impl() {interface} {{"));
    w.line(format!("return &{receiver}{{}}"));
    w.close("}");
    w.into_string()
}

/// `MapperUser` → `mapperUserImpl`
pub fn receiver_name(interface: &str) -> String {
    let mut chars = interface.chars();
    match chars.next() {
        Some(first) => format!("{}{}Impl", first.to_lowercase(), chars.as_str()),
        None => "impl".to_owned(),
    }
}
