//! Finds the path generated code uses to reach `vc_rtti`.
//!
//! The invoking crate's `Cargo.toml` decides:
//!
//! 1. A dependency on `vc_rtti` (possibly renamed) gives `::vc_rtti`.
//! 2. A dependency on the `vc_serial` facade gives `::vc_serial::rtti`.
//! 3. `dev-dependencies` are searched the same way.
//! 4. Anything else, including `vc_rtti` itself, falls back to `::vc_rtti`.
//!
//! Parsed manifests are cached per path and re-read when the file changes.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

const RTTI_CRATE: &str = "vc_rtti";
const FACADE_CRATE: &str = "vc_serial";
const FACADE_MODULE: &str = "rtti";

struct CachedManifest {
    document: Document<Box<str>>,
    modified: SystemTime,
}

/// The `vc_rtti` path as seen from the crate being compiled.
pub(crate) fn vc_rtti_path() -> syn::Path {
    static MANIFESTS: RwLock<BTreeMap<PathBuf, CachedManifest>> = RwLock::new(BTreeMap::new());

    let Some(dir) = env::var_os("CARGO_MANIFEST_DIR") else {
        return fallback();
    };
    let path = PathBuf::from(dir).join("Cargo.toml");
    let Ok(modified) = std::fs::metadata(&path).and_then(|metadata| metadata.modified()) else {
        return fallback();
    };

    let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
    if let Some(cached) = manifests.get(&path)
        && cached.modified == modified
    {
        return resolve(&cached.document);
    }
    drop(manifests);

    let Some(document) = std::fs::read_to_string(&path)
        .ok()
        .and_then(|text| Document::parse(text.into_boxed_str()).ok())
    else {
        return fallback();
    };
    let resolved = resolve(&document);

    MANIFESTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(path, CachedManifest { document, modified });
    resolved
}

fn resolve(manifest: &Document<Box<str>>) -> syn::Path {
    for section in ["dependencies", "dev-dependencies"] {
        if let Some(Item::Table(deps)) = manifest.get(section)
            && let Some(path) = find_in_deps(deps)
        {
            return path;
        }
    }
    fallback()
}

fn find_in_deps(deps: &Table) -> Option<syn::Path> {
    if let Some(key) = dependency_key(deps, RTTI_CRATE) {
        return Some(crate_root(&key));
    }
    let key = dependency_key(deps, FACADE_CRATE)?;
    let mut path = crate_root(&key);
    path.segments.push(syn::PathSegment::from(syn::Ident::new(
        FACADE_MODULE,
        proc_macro2::Span::call_site(),
    )));
    Some(path)
}

/// The name `package` is imported under, honoring `package = "..."` renames.
fn dependency_key(deps: &Table, package: &str) -> Option<String> {
    deps.iter().find_map(|(key, item)| {
        let name = item.get("package").and_then(Item::as_str).unwrap_or(key);
        (name == package).then(|| key.replace('-', "_"))
    })
}

fn crate_root(name: &str) -> syn::Path {
    let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
    syn::parse_quote!(::#ident)
}

#[inline]
fn fallback() -> syn::Path {
    crate_root(RTTI_CRATE)
}
