//! Per-statement dependency extraction.
//!
//! A single left-to-right pass over the token tree, depth-first into
//! groups, classifies identifiers into one written target and a set of read
//! sources. Table references can only begin right after a fixed set of
//! keywords and always end at whitespace, `)` or `;`, which lets the walk
//! reassemble dotted and quoted names without a real SQL grammar. This is a
//! best-effort heuristic: token shapes it does not recognize under-extract,
//! they never fail.

use crate::error::TokenizeError;
use crate::qualify::qualify;
use crate::tokenizer::{tokenize, SqlToken};
use crate::types::{Dialect, QueryExecution, StatementLineage};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Whether a table-reference position was opened by a writing or a reading
/// clause keyword. Only write positions may establish the statement target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TablePosition {
    /// `TABLE`, `INTO`, `UPDATE`
    Write,
    /// `FROM`, `USING`, any `JOIN`
    Read,
}

/// Clause keyword that opens a table-reference position, if any.
fn table_position(normalized: &str) -> Option<TablePosition> {
    match normalized {
        "TABLE" | "INTO" | "UPDATE" => Some(TablePosition::Write),
        "FROM" | "USING" => Some(TablePosition::Read),
        _ if normalized == "JOIN" || normalized.ends_with(" JOIN") => Some(TablePosition::Read),
        _ => None,
    }
}

/// In-progress identifier assembly for one scope. Parenthesized groups
/// start a fresh state; inline groups continue the caller's.
#[derive(Debug, Default, Clone)]
struct ScopeState {
    writing: Option<TablePosition>,
    partial: String,
}

/// Accumulator threaded through the recursive walk: the target and source
/// sets are statement-wide, the CTE name sets form a scope chain that grows
/// within a scope and pops with it.
struct Walker<'a> {
    database: &'a str,
    schema: &'a str,
    target: Option<String>,
    sources: Vec<String>,
    cte_scopes: Vec<HashSet<String>>,
}

impl Walker<'_> {
    fn walk(&mut self, tokens: &[SqlToken], mut state: ScopeState) -> ScopeState {
        let mut cte_pending = false;
        for token in tokens {
            match token {
                SqlToken::Comment(_) => {}
                // The UPDATE embedded in a MERGE is followed by SET, not a
                // table name; dropping the in-progress state here keeps the
                // assignment clause out of the extraction.
                SqlToken::Keyword { normalized, .. } if normalized == "SET" => {
                    state.writing = None;
                    state.partial.clear();
                }
                SqlToken::Keyword { normalized, .. }
                    if cte_pending && normalized == "RECURSIVE" => {}
                SqlToken::Group(children) => {
                    if cte_pending {
                        self.collect_cte_names(children);
                    }
                    cte_pending = false;
                    state = if token.is_parenthesized() {
                        self.cte_scopes.push(HashSet::new());
                        let sub = self.walk(children, ScopeState::default());
                        self.cte_scopes.pop();
                        sub
                    } else {
                        self.walk(children, state)
                    };
                }
                SqlToken::Whitespace(_) => {
                    if state.writing.is_some() && !state.partial.is_empty() {
                        self.commit(&mut state);
                    }
                }
                SqlToken::Keyword { text, normalized } => {
                    if normalized == "WITH" {
                        cte_pending = true;
                    }
                    self.plain_token(text, Some(normalized), &mut state);
                }
                SqlToken::Word(text) => {
                    self.plain_token(text, None, &mut state);
                }
            }
        }
        state
    }

    /// Handles a non-whitespace atomic token: accumulate it into the
    /// in-progress identifier, open a new table position on a clause
    /// keyword, or finalize on a closing delimiter.
    fn plain_token(&mut self, text: &str, normalized: Option<&str>, state: &mut ScopeState) {
        if state.writing.is_some() && text != ")" && text != ";" {
            state.partial.push_str(text);
        }
        if let Some(position) = normalized.and_then(table_position) {
            state.writing = Some(position);
            state.partial.clear();
        }
        if (text == ")" || text == ";") && state.writing.is_some() {
            self.commit(state);
        }
    }

    /// Finalizes the accumulated identifier: CTE names are local aliases
    /// and are skipped; otherwise the qualified name becomes the target
    /// (first write-position commit) or joins the sources.
    fn commit(&mut self, state: &mut ScopeState) {
        let raw = std::mem::take(&mut state.partial);
        let position = state.writing.take();
        if raw.is_empty() || self.is_cte_name(&raw) {
            return;
        }
        let qualified = qualify(self.database, self.schema, &raw);
        #[cfg(feature = "tracing")]
        trace!(%qualified, ?position, "resolved table reference");
        if position == Some(TablePosition::Write) && self.target.is_none() {
            self.target = Some(qualified);
        } else if self.target.as_deref() != Some(qualified.as_str())
            && !self.sources.contains(&qualified)
        {
            self.sources.push(qualified);
        }
    }

    /// Records the CTE names declared by a definition-list group: for each
    /// immediate child, its leading identifier. Must run before anything
    /// inside the group is classified, because a CTE's name reappears later
    /// exactly where a table name would.
    fn collect_cte_names(&mut self, children: &[SqlToken]) {
        let mut names = Vec::new();
        for child in children {
            let name = match child {
                SqlToken::Group(def) => def.first().map(|t| t.to_string()),
                other => Some(other.to_string()),
            };
            if let Some(name) = name {
                names.push(name.to_uppercase());
            }
        }
        if let Some(scope) = self.cte_scopes.last_mut() {
            scope.extend(names);
        }
    }

    fn is_cte_name(&self, raw: &str) -> bool {
        let upper = raw.to_uppercase();
        self.cte_scopes.iter().any(|scope| scope.contains(&upper))
    }
}

/// Extracts the lineage record for one statement's token tree.
///
/// `database` and `schema` are the statement's ambient session context,
/// used to complete partial names. A statement with no discoverable
/// writable position yields an empty record, not an error.
pub fn extract(
    tokens: &[SqlToken],
    database: &str,
    schema: &str,
    executed_at: DateTime<Utc>,
) -> StatementLineage {
    let mut walker = Walker {
        database,
        schema,
        target: None,
        sources: Vec::new(),
        cte_scopes: vec![HashSet::new()],
    };
    let mut state = walker.walk(tokens, ScopeState::default());
    // A trailing identifier with no terminator after it is still a
    // reference; finalize it at the statement boundary.
    if !state.partial.is_empty() && !walker.sources.iter().any(|s| s == &state.partial) {
        walker.commit(&mut state);
    }
    StatementLineage {
        target: walker.target,
        sources: walker.sources,
        executed_at,
    }
}

/// Tokenizes and extracts in one step for a recorded execution.
pub fn extract_execution(
    execution: &QueryExecution,
    dialect: Dialect,
) -> Result<StatementLineage, TokenizeError> {
    let tokens = tokenize(&execution.query_text, dialect)?;
    Ok(extract(
        &tokens,
        &execution.database,
        &execution.schema,
        execution.executed_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use crate::types::Dialect;
    use chrono::TimeZone;

    fn run(sql: &str) -> StatementLineage {
        let tokens = tokenize(sql, Dialect::Generic).unwrap();
        extract(&tokens, "DB", "S", now())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_select_join() {
        let record = run(
            "INSERT INTO \"DB\".\"S\".\"SALES_AGG\" SELECT * FROM \"DB\".\"S\".\"SALES\" s \
             JOIN \"DB\".\"S\".\"CUSTOMERS\" c ON s.id=c.id",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"SALES_AGG\""));
        assert_eq!(
            record.sources,
            vec!["\"DB\".\"S\".\"SALES\"", "\"DB\".\"S\".\"CUSTOMERS\""]
        );
    }

    #[test]
    fn test_unqualified_names_use_session_context() {
        let record = run("INSERT INTO sales_agg SELECT * FROM sales");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"SALES_AGG\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"SALES\""]);
    }

    #[test]
    fn test_cte_name_is_never_a_table() {
        let record =
            run("WITH recent AS (SELECT * FROM \"DB\".\"S\".\"ORDERS\") SELECT * FROM recent");
        assert_eq!(record.target, None);
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"ORDERS\""]);
    }

    #[test]
    fn test_multiple_ctes_are_all_excluded() {
        let record = run(
            "INSERT INTO t WITH a AS (SELECT * FROM u), b AS (SELECT * FROM a) \
             SELECT * FROM b JOIN v ON b.id = v.id",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"U\"", "\"DB\".\"S\".\"V\""]);
    }

    #[test]
    fn test_with_recursive_is_skipped() {
        let record = run(
            "INSERT INTO t WITH RECURSIVE r AS (SELECT * FROM seed) SELECT * FROM r",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"SEED\""]);
    }

    #[test]
    fn test_merge_set_clause_is_not_a_target() {
        let record = run(
            "MERGE INTO \"DB\".\"S\".\"T\" USING \"DB\".\"S\".\"U\" ON t.id = u.id \
             WHEN MATCHED THEN UPDATE SET x = 1",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"U\""]);
    }

    #[test]
    fn test_update_statement() {
        let record = run("UPDATE t SET x = (SELECT max(y) FROM u)");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"U\""]);
    }

    #[test]
    fn test_create_table_as_select() {
        let record = run("CREATE TABLE agg AS SELECT * FROM base;");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"AGG\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"BASE\""]);
    }

    #[test]
    fn test_copy_into_stage_is_target() {
        let record = run("COPY INTO @unload/out FROM \"DB\".\"S\".\"T\"");
        assert_eq!(record.target.as_deref(), Some("@\"DB\".\"S\".\"UNLOAD/OUT\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"T\""]);
    }

    #[test]
    fn test_copy_from_stage_is_source() {
        let record = run("COPY INTO raw_orders FROM @ingest");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"RAW_ORDERS\""));
        assert_eq!(record.sources, vec!["@\"DB\".\"S\".\"INGEST\""]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let record = run(
            "INSERT INTO t -- writes into t\nSELECT * FROM /* the source */ u",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"U\""]);
    }

    #[test]
    fn test_subquery_in_from() {
        let record = run(
            "INSERT INTO t SELECT * FROM (SELECT a FROM inner_one) x JOIN other ON x.a = other.a",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(
            record.sources,
            vec!["\"DB\".\"S\".\"INNER_ONE\"", "\"DB\".\"S\".\"OTHER\""]
        );
    }

    #[test]
    fn test_bare_select_has_no_target() {
        let record = run("SELECT * FROM a JOIN b ON a.id = b.id");
        assert_eq!(record.target, None);
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"A\"", "\"DB\".\"S\".\"B\""]);
    }

    #[test]
    fn test_duplicate_sources_are_collapsed() {
        let record = run("INSERT INTO t SELECT * FROM u UNION ALL SELECT * FROM u");
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"U\""]);
    }

    #[test]
    fn test_trailing_identifier_without_terminator() {
        let record = run("INSERT INTO t SELECT * FROM final_source");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"FINAL_SOURCE\""]);
    }

    #[test]
    fn test_trailing_target_only() {
        let record = run("INSERT INTO t");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert!(record.sources.is_empty());
    }

    #[test]
    fn test_target_never_appears_in_sources() {
        let record = run("INSERT INTO t SELECT * FROM t");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert!(record.sources.is_empty());
    }

    #[test]
    fn test_dotted_name_reassembly() {
        let record = run("INSERT INTO other_db.sch.t SELECT * FROM other_db.sch.u");
        assert_eq!(record.target.as_deref(), Some("\"OTHER_DB\".\"SCH\".\"T\""));
        assert_eq!(record.sources, vec!["\"OTHER_DB\".\"SCH\".\"U\""]);
    }

    #[test]
    fn test_quoted_mixed_case_identifier() {
        let record = run("INSERT INTO \"Events\" SELECT * FROM \"Raw\".\"Log\"");
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"Events\""));
        assert_eq!(record.sources, vec!["\"DB\".\"Raw\".\"Log\""]);
    }

    #[test]
    fn test_no_table_positions_yields_empty_record() {
        let record = run("SELECT 1 + 1");
        assert_eq!(record.target, None);
        assert!(record.sources.is_empty());
        assert_eq!(record.executed_at, now());
    }

    #[test]
    fn test_cte_scope_does_not_leak_hiding() {
        // A CTE named inside a subquery must not mask a real table of the
        // same name referenced after that subquery closed.
        let record = run(
            "INSERT INTO t SELECT * FROM (WITH x AS (SELECT 1) SELECT * FROM x) q \
             JOIN x ON q.a = x.a",
        );
        assert_eq!(record.target.as_deref(), Some("\"DB\".\"S\".\"T\""));
        assert_eq!(record.sources, vec!["\"DB\".\"S\".\"X\""]);
    }
}
