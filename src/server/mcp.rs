use std::sync::Arc;
use crate::corpus;
use crate::resolver::Resolver;
use crate::server::format;
use mcp_sdk_rs::server::{Server, ServerHandler};
use mcp_sdk_rs::types::{
    Tool, ToolResult, ListToolsResult,
    Implementation, ClientCapabilities, ServerCapabilities
};
use mcp_sdk_rs::error::ErrorCode;
use mcp_sdk_rs::transport::stdio::StdioTransport;
use mcp_sdk_rs::error::Error;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use serde::Deserialize;

const DEFAULT_SEARCH_RESULTS: i64 = 5;
const MAX_SEARCH_RESULTS: i64 = 10;
const DEFAULT_MATCHES: i64 = 3;
const MAX_MATCHES: i64 = 5;

#[derive(Deserialize)]
struct CallToolRequest {
    name: String,
    arguments: Option<Value>,
}

#[derive(Deserialize)]
struct LookupArgs {
    reference: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    max_results: Option<i64>,
}

#[derive(Deserialize)]
struct FuzzyArgs {
    garbled_sanskrit: String,
    top_n: Option<i64>,
}

#[derive(Deserialize)]
struct ChapterArgs {
    chapter: i64,
}

pub struct McpService {
    resolver: Arc<Resolver>,
}

impl McpService {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }

    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let (read_tx, read_rx) = mpsc::channel::<String>(32);
        let (write_tx, mut write_rx) = mpsc::channel::<String>(32);

        // Stdin reader
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if read_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        // Stdout writer
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(msg) = write_rx.recv().await {
                let _ = stdout.write_all(msg.as_bytes()).await;
                let _ = stdout.write_all(b"\n").await;
                let _ = stdout.flush().await;
            }
        });

        tracing::info!("MCP server listening on stdio");
        let transport = StdioTransport::new(read_rx, write_tx);
        let server = Server::new(Arc::new(transport), Arc::new(self.clone()));
        server.start().await?;
        Ok(())
    }

    /// Run one tool. Library failures come back as text for the client;
    /// only an unknown tool or bad arguments are protocol errors.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, Error> {
        tracing::debug!(tool = name, "Tool call");

        let text = match name {
            "lookup_verse" => {
                let args: LookupArgs = parse_args(arguments)?;
                match self.resolver.resolve_reference(&args.reference).await {
                    Ok(resolution) => format::verse(&resolution),
                    Err(e) => format::error(&e),
                }
            }
            "search_verses" => {
                let args: SearchArgs = parse_args(arguments)?;
                let limit = args.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS).clamp(1, MAX_SEARCH_RESULTS);
                match self.resolver.search(&args.query, limit as usize) {
                    Ok(results) => format::search(&args.query, &results),
                    Err(e) => format::error(&e),
                }
            }
            "fuzzy_match_verse" => {
                let args: FuzzyArgs = parse_args(arguments)?;
                let top_n = args.top_n.unwrap_or(DEFAULT_MATCHES).clamp(1, MAX_MATCHES);
                match self.resolver.match_text(&args.garbled_sanskrit, top_n as usize) {
                    Ok(candidates) => {
                        let top = match candidates.first() {
                            Some(candidate) => self.resolver.cache().get(candidate.reference).ok().flatten(),
                            None => None,
                        };
                        format::matches(&args.garbled_sanskrit, &candidates, top.as_ref())
                    }
                    Err(e) => format::error(&e),
                }
            }
            "get_chapter_summary" => {
                let args: ChapterArgs = parse_args(arguments)?;
                let max = i64::from(corpus::CHAPTER_COUNT);
                if !(1..=max).contains(&args.chapter) {
                    format!("Error: Chapter must be 1-{}, got {}.", max, args.chapter)
                } else {
                    match self.resolver.resolve_chapter(args.chapter as u32).await {
                        Ok(resolution) => format::chapter(&resolution.record),
                        Err(e) => format!("Error fetching chapter {}: {}", args.chapter, e),
                    }
                }
            }
            "seed_database" => match self.resolver.seed_all().await {
                Ok(report) => format::seed(&report),
                Err(e) => format::error(&e),
            },
            _ => return Err(Error::protocol(ErrorCode::MethodNotFound, name.to_string())),
        };
        Ok(text)
    }
}

impl Clone for McpService {
    fn clone(&self) -> Self {
        Self { resolver: self.resolver.clone() }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, Error> {
    serde_json::from_value(arguments).map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))
}

fn tool(name: &str, description: &str, schema: Value) -> Result<Tool, Error> {
    Ok(Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::from_value(schema)
            .map_err(|e| Error::protocol(ErrorCode::ParseError, e.to_string()))?,
        annotations: None,
    })
}

fn tool_definitions() -> Result<Vec<Tool>, Error> {
    Ok(vec![
        tool(
            "lookup_verse",
            "Look up a Bhagavad Gita verse by reference (\"BG 2.47\", \"2:47\", \"bg 15-7\", \
             \"Bhagavad Gita 9.34\"). Returns Sanskrit, transliteration, Prabhupada's translation, \
             synonyms and purport.",
            json!({
                "type": "object",
                "properties": {
                    "reference": { "type": "string" }
                },
                "required": ["reference"]
            }),
        )?,
        tool(
            "search_verses",
            "Search cached verses by keyword across transliteration, translation and Sanskrit text. \
             max_results: 1-10 (default 5).",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "max_results": { "type": "integer" }
                },
                "required": ["query"]
            }),
        )?,
        tool(
            "fuzzy_match_verse",
            "Match garbled or phonetic Sanskrit from a transcript to the closest verses. \
             top_n: 1-5 (default 3).",
            json!({
                "type": "object",
                "properties": {
                    "garbled_sanskrit": { "type": "string" },
                    "top_n": { "type": "integer" }
                },
                "required": ["garbled_sanskrit"]
            }),
        )?,
        tool(
            "get_chapter_summary",
            "Chapter metadata and summary. chapter: 1-18.",
            json!({
                "type": "object",
                "properties": {
                    "chapter": { "type": "integer" }
                },
                "required": ["chapter"]
            }),
        )?,
        tool(
            "seed_database",
            "Download every verse from the bulk source into the local cache. Skips verses \
             already cached; Vedabase enrichment happens lazily on lookup.",
            json!({ "type": "object", "properties": {} }),
        )?,
    ])
}

#[async_trait]
impl ServerHandler for McpService {
    async fn initialize(
        &self,
        _implementation: Implementation,
        _capabilities: ClientCapabilities
    ) -> Result<ServerCapabilities, Error> {
        Ok(ServerCapabilities::default())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        match method {
            "tools/list" => {
                let result = ListToolsResult { tools: tool_definitions()?, next_cursor: None };
                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            },
            "tools/call" => {
                let req: CallToolRequest = params.and_then(|v| serde_json::from_value(v).ok())
                    .ok_or(Error::protocol(ErrorCode::InvalidParams, "Missing params"))?;

                let text = self.call_tool(&req.name, req.arguments.unwrap_or_else(|| json!({}))).await?;

                let result = ToolResult {
                    content: Vec::new(),
                    structured_content: Some(json!([{ "type": "text", "text": text }])),
                };
                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            },
            _ => Err(Error::protocol(ErrorCode::MethodNotFound, method.to_string()))
        }
    }
}
