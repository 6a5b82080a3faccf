//! Template Renderer
//!
//! Identifier templates are literal text interleaved with `{{ path }}`
//! placeholders. Supported roots are `parameters`, `setup.configuration`,
//! `setup.client_metadata` and `external_name`; a leading `.` is accepted so
//! `{{ .parameters.api_id }}` and `{{ parameters.api_id }}` are the same
//! placeholder. There are no conditionals, loops or escapes.

use super::context::ResolveContext;
use super::error::{ExternalNameError, Result};
use super::params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Parameters,
    Configuration,
    ClientMetadata,
    ExternalName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    /// Canonical dotted form, e.g. `parameters.api_id`
    expression: String,
    root: Root,
    path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

impl Segment {
    fn literal(&self) -> Option<&str> {
        match self {
            Segment::Literal(text) => Some(text),
            Segment::Placeholder(_) => None,
        }
    }

    fn is_literal(&self) -> bool {
        self.literal().is_some()
    }

    fn is_external_name(&self) -> bool {
        matches!(self, Segment::Placeholder(p) if p.root == Root::ExternalName)
    }
}

/// A parsed identifier template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting unterminated or unknown placeholders
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                return Err(syntax_error(source, "unterminated placeholder"));
            };

            segments.push(Segment::Placeholder(parse_placeholder(source, &after[..end])?));
            rest = &after[end + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn references_external_name(&self) -> bool {
        self.segments.iter().any(Segment::is_external_name)
    }

    /// Top-level parameter fields referenced by the template, in order of first use
    pub fn parameter_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(p) = segment {
                if p.root == Root::Parameters && !fields.contains(&p.path[0].as_str()) {
                    fields.push(&p.path[0]);
                }
            }
        }
        fields
    }

    /// Substitute every placeholder from the context
    pub fn render(&self, ctx: &ResolveContext<'_>) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => out.push_str(self.resolve(p, ctx)?),
            }
        }

        Ok(out)
    }

    fn resolve<'c>(&self, placeholder: &Placeholder, ctx: &ResolveContext<'c>) -> Result<&'c str> {
        let layer = match placeholder.root {
            Root::ExternalName => return Ok(ctx.external_name),
            Root::Parameters => Some(ctx.parameters),
            Root::Configuration => ctx.setup.configuration,
            Root::ClientMetadata => ctx.setup.client_metadata,
        };

        let value = layer
            .and_then(|bag| params::get_path(bag, &placeholder.path).ok())
            .ok_or_else(|| ExternalNameError::unresolved(&self.source, &placeholder.expression))?;

        value
            .as_str()
            .ok_or_else(|| ExternalNameError::type_mismatch(&placeholder.expression, "a string"))
    }

    /// Recover the external name from an identifier this template rendered.
    ///
    /// Only bounded string operations are used: the text around the first
    /// `external_name` placeholder must be a fixed prefix/suffix or a
    /// separator literal. Values substituted before the name are assumed not
    /// to contain the separator that follows them unless the name is the last
    /// placeholder, in which case the last separator occurrence wins.
    pub fn extract_external_name<'v>(&self, id: &'v str) -> Result<&'v str> {
        let Some(pos) = self.segments.iter().position(Segment::is_external_name) else {
            return Ok(id);
        };
        let before = &self.segments[..pos];
        let after = &self.segments[pos + 1..];
        let mismatch = || {
            ExternalNameError::type_mismatch(
                "id",
                format!("an identifier shaped like `{}`", self.source),
            )
        };

        let trailing = after.iter().all(Segment::is_literal);
        let mut rest = id;

        if trailing {
            let suffix: String = after.iter().filter_map(Segment::literal).collect();
            rest = rest.strip_suffix(suffix.as_str()).ok_or_else(mismatch)?;
        }

        if before.iter().all(Segment::is_literal) {
            let prefix: String = before.iter().filter_map(Segment::literal).collect();
            rest = rest.strip_prefix(prefix.as_str()).ok_or_else(mismatch)?;
        } else {
            let Some(Segment::Literal(sep)) = before.last() else {
                return Err(mismatch());
            };
            let start = if trailing {
                rest.rfind(sep.as_str()).ok_or_else(mismatch)?
            } else {
                let skip: usize = before
                    .iter()
                    .filter_map(Segment::literal)
                    .map(|text| text.matches(sep.as_str()).count())
                    .sum();
                rest.match_indices(sep.as_str())
                    .nth(skip - 1)
                    .map(|(idx, _)| idx)
                    .ok_or_else(mismatch)?
            };
            rest = &rest[start + sep.len()..];
        }

        if trailing {
            return Ok(rest);
        }

        let Some(Segment::Literal(sep)) = after.first() else {
            return Err(mismatch());
        };
        let end = rest.find(sep.as_str()).ok_or_else(mismatch)?;
        Ok(&rest[..end])
    }
}

/// Render a template string; the empty template is the literal external name
pub fn render(template: &str, ctx: &ResolveContext<'_>) -> Result<String> {
    if template.is_empty() {
        return Ok(ctx.external_name.to_string());
    }
    Template::parse(template)?.render(ctx)
}

fn parse_placeholder(template: &str, inner: &str) -> Result<Placeholder> {
    let inner = inner.trim();
    let expression = inner.strip_prefix('.').unwrap_or(inner);
    if expression.is_empty() {
        return Err(syntax_error(template, "empty placeholder"));
    }

    let parts: Vec<&str> = expression.split('.').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(syntax_error(
            template,
            &format!("malformed placeholder `{}`", inner),
        ));
    }

    let (root, path) = match parts.as_slice() {
        ["external_name"] => (Root::ExternalName, &[][..]),
        ["parameters", path @ ..] if !path.is_empty() => (Root::Parameters, path),
        ["setup", "configuration", path @ ..] if !path.is_empty() => (Root::Configuration, path),
        ["setup", "client_metadata", path @ ..] if !path.is_empty() => {
            (Root::ClientMetadata, path)
        }
        _ => {
            return Err(syntax_error(
                template,
                &format!("unknown placeholder `{}`", inner),
            ))
        }
    };

    Ok(Placeholder {
        expression: parts.join("."),
        root,
        path: path.iter().map(|p| p.to_string()).collect(),
    })
}

fn syntax_error(template: &str, reason: &str) -> ExternalNameError {
    ExternalNameError::TemplateRender {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}
