//! SkillMapper — attaches a tool identity to a failure trace.
//!
//! Tier-2 lessons are scoped to the tool they were learned on, so they are
//! only injected when that tool is active. The mapper resolves the tool in
//! two steps: a direct hit on the trace's structured tool call, then a
//! keyword-count fallback over the trace text.

use lessonbank_core::trace::FailureTrace;

/// Sentinel bucket for traces that match no registered tool.
pub const GENERAL_TOOL: &str = "general";

/// A registered tool and the keywords that signal its use.
#[derive(Debug, Clone)]
pub struct ToolSignature {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Maps failure traces to tool identifiers.
///
/// Registration order is significant: when two tools match the same number
/// of keywords, the first-registered one wins. The registry is plain owned
/// state — construct one per controller, no global.
pub struct SkillMapper {
    signatures: Vec<ToolSignature>,
}

impl SkillMapper {
    /// An empty mapper. Every semantic lookup resolves to [`GENERAL_TOOL`]
    /// until tools are registered.
    pub fn new() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// A mapper seeded with the built-in tool signatures.
    pub fn with_default_tools() -> Self {
        let mut mapper = Self::new();
        mapper.register(
            "sql_db",
            &[
                "sql", "select", "query", "table", "database", "insert", "schema", "rows",
            ],
        );
        mapper.register(
            "python_repl",
            &[
                "python", "import", "pandas", "numpy", "dataframe", "print", "script",
            ],
        );
        mapper.register(
            "file_system",
            &["file", "directory", "path", "folder", "read", "write", "delete"],
        );
        mapper.register(
            "web_search",
            &["search", "web", "url", "browse", "lookup", "http"],
        );
        mapper
    }

    /// Register a tool signature. Keywords are normalized to lowercase.
    ///
    /// Re-registering a name replaces its keywords in place, keeping the
    /// original position so tie-breaking stays reproducible.
    pub fn register(&mut self, name: &str, keywords: &[&str]) {
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        if let Some(existing) = self.signatures.iter_mut().find(|s| s.name == name) {
            existing.keywords = keywords;
        } else {
            self.signatures.push(ToolSignature {
                name: name.to_string(),
                keywords,
            });
        }
    }

    /// Registered tool names, in registration order.
    pub fn list_tools(&self) -> Vec<&str> {
        self.signatures.iter().map(|s| s.name.as_str()).collect()
    }

    /// Resolve the tool a trace belongs to.
    ///
    /// 1. Direct hit: a non-empty `tool_call.tool` is returned normalized,
    ///    with no further matching.
    /// 2. Semantic fallback: keyword hits are counted over the tokenized
    ///    reasoning and tool output; the strictly highest nonzero count
    ///    wins, ties going to the first-registered tool.
    /// 3. No hits: [`GENERAL_TOOL`].
    pub fn extract_tool_context(&self, trace: &FailureTrace) -> String {
        if let Some(call) = &trace.tool_call {
            let direct = call.tool.trim().to_lowercase();
            if !direct.is_empty() {
                return direct;
            }
        }

        let mut haystack = trace.agent_reasoning.clone();
        if let Some(output) = &trace.tool_output {
            haystack.push(' ');
            haystack.push_str(output);
        }
        let tokens = tokenize(&haystack);

        let mut best: Option<(&str, usize)> = None;
        for signature in &self.signatures {
            let hits = signature
                .keywords
                .iter()
                .filter(|k| tokens.contains(k.as_str()))
                .count();
            if hits == 0 {
                continue;
            }
            // Strictly-greater keeps the first-registered tool on ties.
            match best {
                Some((_, best_hits)) if hits <= best_hits => {}
                _ => best = Some((&signature.name, hits)),
            }
        }

        best.map(|(name, _)| name.to_string())
            .unwrap_or_else(|| GENERAL_TOOL.to_string())
    }
}

impl Default for SkillMapper {
    fn default() -> Self {
        Self::with_default_tools()
    }
}

fn tokenize(text: &str) -> std::collections::HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
