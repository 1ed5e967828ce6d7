//! GLSL include expansion, performed ahead of the front-end parse.
//!
//! The front end has no notion of `#include`; directives are expanded
//! textually against the compiler's search paths before parsing. A depth
//! limit guards against include cycles.

use std::path::PathBuf;

use super::CompileError;

const MAX_INCLUDE_DEPTH: usize = 32;

/// Expand every `#include "file"` directive and make sure the result
/// carries a `#version` directive the parser accepts.
pub(crate) fn preprocess(source: &str, include_paths: &[PathBuf]) -> Result<String, CompileError> {
    let mut out = String::with_capacity(source.len());
    if !source.contains("#version") {
        out.push_str("#version 450\n");
    }
    expand_into(&mut out, source, include_paths, 0)?;
    Ok(out)
}

fn expand_into(
    out: &mut String,
    source: &str,
    include_paths: &[PathBuf],
    depth: usize,
) -> Result<(), CompileError> {
    for line in source.lines() {
        let Some(name) = parse_include(line) else {
            out.push_str(line);
            out.push('\n');
            continue;
        };
        if depth + 1 > MAX_INCLUDE_DEPTH {
            return Err(CompileError::IncludeCycle {
                path: name.to_string(),
            });
        }
        let resolved = include_paths
            .iter()
            .map(|base| base.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| CompileError::Include {
                path: name.to_string(),
            })?;
        let text = std::fs::read_to_string(&resolved).map_err(|source| CompileError::Io {
            path: resolved.display().to_string(),
            source,
        })?;
        expand_into(out, &text, include_paths, depth + 1)?;
    }
    Ok(())
}

fn parse_include(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("#include")?.trim();
    rest.strip_prefix('"')?.strip_suffix('"')
}
