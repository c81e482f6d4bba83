//! LSP server implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use flowlens_actions::{ActionCache, OfflineResolver};
use flowlens_context::Snapshot;
use flowlens_resolve::{Category, Fix, Severity};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::debug;

use crate::debounce::DebounceMap;

/// Quiescence window before a changed document is rebuilt.
const REBUILD_DELAY: Duration = Duration::from_millis(1000);

/// Document state tracked by the server
struct DocumentState {
    /// Document content
    content: String,
    /// Last committed snapshot; `None` until the first rebuild lands or when
    /// the document does not parse at all
    snapshot: Option<Arc<Snapshot>>,
    /// Document version
    version: i32,
}

type Documents = Arc<RwLock<HashMap<Url, DocumentState>>>;

/// The workflow language server
pub struct FlowlensLanguageServer {
    /// LSP client for sending notifications
    client: Client,
    /// Open documents
    documents: Documents,
    /// Metadata for `uses:` references
    actions: Arc<ActionCache>,
    /// Pending-rebuild bookkeeping
    debounce: Arc<DebounceMap>,
}

impl FlowlensLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
            actions: Arc::new(ActionCache::new(Box::new(OfflineResolver))),
            debounce: Arc::new(DebounceMap::default()),
        }
    }
}

/// Rebuild one document's snapshot, validate it, and publish the result.
///
/// Action references found in the new snapshot are resolved first; when that
/// changes metadata other open documents rely on, those documents are
/// revalidated too.
async fn rebuild(client: Client, documents: Documents, actions: Arc<ActionCache>, uri: Url) {
    let (snapshot, content, version) = {
        let mut docs = documents.write().await;
        let Some(doc) = docs.get_mut(&uri) else { return };
        let snapshot = Snapshot::build(&doc.content).map(Arc::new);
        doc.snapshot = snapshot.clone();
        (snapshot, doc.content.clone(), doc.version)
    };

    let mut changed = Vec::new();
    let diagnostics = match &snapshot {
        Some(snapshot) => {
            let references: Vec<String> = snapshot
                .context
                .actions_used
                .iter()
                .map(|a| a.reference.clone())
                .collect();
            changed = actions.resolve_batch(&references);
            flowlens_resolve::validate(snapshot, Some(&*actions))
                .into_iter()
                .map(|d| to_lsp_diagnostic(&content, d))
                .collect()
        }
        // an unparseable document gets no findings rather than stale ones
        None => Vec::new(),
    };
    debug!(%uri, count = diagnostics.len(), "publishing diagnostics");
    client
        .publish_diagnostics(uri.clone(), diagnostics, Some(version))
        .await;

    if !changed.is_empty() {
        revalidate_users(&client, &documents, &actions, &changed, &uri).await;
    }
}

/// Republish diagnostics for every other open document that uses one of the
/// freshly resolved actions.
async fn revalidate_users(
    client: &Client,
    documents: &Documents,
    actions: &ActionCache,
    changed: &[String],
    skip: &Url,
) {
    let mut pending = Vec::new();
    {
        let docs = documents.read().await;
        for (uri, doc) in docs.iter() {
            if uri == skip {
                continue;
            }
            let Some(snapshot) = &doc.snapshot else {
                continue;
            };
            let affected = snapshot
                .context
                .actions_used
                .iter()
                .any(|a| changed.contains(&a.reference));
            if !affected {
                continue;
            }
            let diagnostics = flowlens_resolve::validate(snapshot, Some(actions))
                .into_iter()
                .map(|d| to_lsp_diagnostic(&doc.content, d))
                .collect::<Vec<_>>();
            pending.push((uri.clone(), diagnostics, doc.version));
        }
    }
    for (uri, diagnostics, version) in pending {
        client
            .publish_diagnostics(uri, diagnostics, Some(version))
            .await;
    }
}

/// Map a resolver finding onto the wire type, carrying fixes in `data`.
fn to_lsp_diagnostic(content: &str, diagnostic: flowlens_resolve::Diagnostic) -> Diagnostic {
    let range = Range {
        start: offset_to_position(content, diagnostic.range.start as usize),
        end: offset_to_position(content, diagnostic.range.end as usize),
    };
    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::WeakWarning => DiagnosticSeverity::HINT,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };
    let data = (!diagnostic.fixes.is_empty()).then(|| diagnostic.fixes_to_json());

    Diagnostic {
        range,
        severity: Some(severity),
        code: None,
        code_description: None,
        source: Some("flowlens".to_string()),
        message: diagnostic.message,
        related_information: None,
        tags: None,
        data,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for FlowlensLanguageServer {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                // Full document sync - we get the whole document on each change
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                // Auto-completion inside expressions
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".into(), "{".into()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                // Code actions (quick fixes)
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "flowlens-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Flowlens language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut docs = self.documents.write().await;
            docs.insert(
                uri.clone(),
                DocumentState {
                    content: params.text_document.text,
                    snapshot: None,
                    version: params.text_document.version,
                },
            );
        }

        // a freshly opened document is validated right away
        self.debounce.bump(&uri);
        rebuild(
            self.client.clone(),
            Arc::clone(&self.documents),
            Arc::clone(&self.actions),
            uri,
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // With FULL sync, we get the entire document content
        let Some(change) = params.content_changes.into_iter().next() else {
            return;
        };
        {
            let mut docs = self.documents.write().await;
            let Some(doc) = docs.get_mut(&uri) else { return };
            doc.content = change.text;
            doc.version = version;
        }

        let generation = self.debounce.bump(&uri);
        let client = self.client.clone();
        let documents = Arc::clone(&self.documents);
        let actions = Arc::clone(&self.actions);
        let debounce = Arc::clone(&self.debounce);
        tokio::spawn(async move {
            tokio::time::sleep(REBUILD_DELAY).await;
            if !debounce.is_current(&uri, generation) {
                return;
            }
            rebuild(client, documents, actions, uri).await;
        });
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.debounce.forget(&uri);
        {
            let mut docs = self.documents.write().await;
            docs.remove(&uri);
        }

        // Clear diagnostics
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let docs = self.documents.read().await;
        let Some(doc) = docs.get(&uri) else {
            return Ok(None);
        };
        let Some(snapshot) = &doc.snapshot else {
            return Ok(None);
        };

        let offset = position_to_offset(&doc.content, position);
        let found = flowlens_resolve::complete(snapshot, offset as u32, Some(&*self.actions));
        if found.is_empty() {
            return Ok(None);
        }

        // the resolver already ranked the list; sort_text pins that order
        let items = found
            .into_iter()
            .enumerate()
            .map(|(order, item)| CompletionItem {
                label: item.label,
                detail: item.detail,
                kind: Some(match item.category {
                    Category::Namespace => CompletionItemKind::MODULE,
                    Category::Member => CompletionItemKind::FIELD,
                }),
                sort_text: Some(format!("{order:03}")),
                ..Default::default()
            })
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;

        let docs = self.documents.read().await;
        let Some(doc) = docs.get(&uri) else {
            return Ok(None);
        };

        let mut actions = Vec::new();
        for diag in &params.context.diagnostics {
            // Only process our diagnostics
            if diag.source.as_deref() != Some("flowlens") {
                continue;
            }
            let Some(data) = &diag.data else { continue };

            for (index, fix) in Fix::from_json(data).into_iter().enumerate() {
                let edit = TextEdit {
                    range: Range {
                        start: offset_to_position(&doc.content, fix.range.start as usize),
                        end: offset_to_position(&doc.content, fix.range.end as usize),
                    },
                    new_text: fix.replacement,
                };

                let mut changes = HashMap::new();
                changes.insert(uri.clone(), vec![edit]);

                actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                    title: fix.label,
                    kind: Some(CodeActionKind::QUICKFIX),
                    diagnostics: Some(vec![diag.clone()]),
                    edit: Some(WorkspaceEdit {
                        changes: Some(changes),
                        ..Default::default()
                    }),
                    // fixes arrive best-first
                    is_preferred: Some(index == 0),
                    ..Default::default()
                }));
            }
        }

        if actions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(actions))
        }
    }
}

/// Convert byte offset to LSP Position
fn offset_to_position(content: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut col = 0u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }

    Position::new(line, col)
}

/// Convert LSP Position to byte offset
fn position_to_offset(content: &str, position: Position) -> usize {
    let mut current_line = 0u32;
    let mut current_col = 0u32;

    for (i, ch) in content.char_indices() {
        if current_line == position.line && current_col == position.character {
            return i;
        }
        if ch == '\n' {
            if current_line == position.line {
                // Position is past end of line
                return i;
            }
            current_line += 1;
            current_col = 0;
        } else {
            current_col += 1;
        }
    }

    content.len()
}

pub async fn run() -> eyre::Result<()> {
    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(FlowlensLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlens_resolve::{DiagnosticKind, Severity};
    use flowlens_tree::Span;

    #[test]
    fn test_offset_position_round_trip() {
        let content = "jobs:\n  build:\n    runs-on: ubuntu-latest\n";
        let offset = content.find("runs-on").unwrap();
        let position = offset_to_position(content, offset);
        assert_eq!(position, Position::new(2, 4));
        assert_eq!(position_to_offset(content, position), offset);
    }

    #[test]
    fn test_position_past_line_end_clamps() {
        let content = "on: push\njobs:\n";
        let offset = position_to_offset(content, Position::new(0, 99));
        assert_eq!(offset, content.find('\n').unwrap());
    }

    #[test]
    fn test_diagnostic_mapping_carries_fixes() {
        let content = "echo ${{ inputs.tagret }}\n";
        let start = content.find("tagret").unwrap() as u32;
        let diagnostic = flowlens_resolve::Diagnostic::new(
            DiagnosticKind::UndefinedReference,
            Severity::Error,
            Span::new(start, start + 6),
            "Undefined reference [tagret]",
        )
        .with_fixes(vec![Fix {
            label: "Replace with [target]".to_string(),
            range: Span::new(start, start + 6),
            replacement: "target".to_string(),
        }]);

        let mapped = to_lsp_diagnostic(content, diagnostic);
        assert_eq!(mapped.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(mapped.source.as_deref(), Some("flowlens"));
        assert_eq!(mapped.range.start, Position::new(0, 16));
        let fixes = Fix::from_json(mapped.data.as_ref().unwrap());
        assert_eq!(fixes[0].replacement, "target");
    }

    #[test]
    fn test_hints_map_to_hint_severity() {
        let diagnostic = flowlens_resolve::Diagnostic::new(
            DiagnosticKind::UnusedDeclaration,
            Severity::WeakWarning,
            Span::new(0, 4),
            "Unused [build]",
        );
        let mapped = to_lsp_diagnostic("build\n", diagnostic);
        assert_eq!(mapped.severity, Some(DiagnosticSeverity::HINT));
    }
}
