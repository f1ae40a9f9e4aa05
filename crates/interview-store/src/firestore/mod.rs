//! Cloud Firestore backend over the REST v1 API.
//!
//! Questions are read from the `questionBank` collection with a structured
//! query. Audit records go to `conversations/{user}/{role}` and
//! `scores/{user}/{role}` (auto ids) and are merged into `final_scores/{user}`.

pub mod value;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

use interview_core::model::Question;
use interview_core::traits::{
    AuditLog, ConversationRecord, FinalScoreRecord, QuestionRepository, ScoreRecord,
};

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
pub const QUESTION_COLLECTION: &str = "questionBank";

/// Firestore-backed question repository and audit log.
pub struct FirestoreStore {
    documents_root: Url,
    access_token: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl FirestoreStore {
    /// Create a store for `projects/{project_id}/databases/{database}`.
    pub fn new(
        project_id: &str,
        database: &str,
        access_token: Option<String>,
        base_url: Option<&str>,
    ) -> Result<Self> {
        let base = base_url.unwrap_or(FIRESTORE_BASE_URL);
        let mut documents_root =
            Url::parse(base).with_context(|| format!("invalid Firestore base URL: {base}"))?;
        documents_root
            .path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Firestore base URL cannot be a base: {base}"))?
            .pop_if_empty()
            .extend(["v1", "projects", project_id, "databases", database, "documents"]);

        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            documents_root,
            access_token: access_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.documents_root.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Firestore URL cannot be a base"))?
            .extend(segments);
        Ok(url)
    }

    /// `.../documents:runQuery` sits beside the documents root, not under it.
    fn run_query_url(&self) -> Result<Url> {
        let mut url = self.documents_root.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Firestore URL cannot be a base"))?
            .pop()
            .push("documents:runQuery");
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder, op: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(req)
            .send()
            .await
            .with_context(|| format!("Firestore {op} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Firestore {op} failed (HTTP {}): {body}", status.as_u16());
        }
        Ok(response)
    }

    async fn run_query(&self, structured_query: Value) -> Result<Vec<Document>> {
        let req = self
            .client
            .post(self.run_query_url()?)
            .json(&json!({ "structuredQuery": structured_query }));

        let items: Vec<RunQueryItem> = self
            .send(req, "runQuery")
            .await?
            .json()
            .await
            .context("failed to parse Firestore runQuery response")?;

        Ok(items.into_iter().filter_map(|i| i.document).collect())
    }

    async fn add_document(&self, collection: [&str; 3], fields: Map<String, Value>) -> Result<()> {
        let req = self
            .client
            .post(self.url(collection)?)
            .json(&json!({ "fields": fields }));
        self.send(req, "add").await?;
        Ok(())
    }
}

/// Encode a record's serialized fields, replacing `timestamp` with a
/// Firestore timestamp value.
fn record_fields<T: serde::Serialize>(
    record: &T,
    ts: &chrono::DateTime<chrono::Utc>,
) -> Result<Map<String, Value>> {
    let Value::Object(map) = serde_json::to_value(record)? else {
        anyhow::bail!("audit record did not serialize to an object");
    };
    let mut fields = value::encode_fields(&map);
    if fields.contains_key("timestamp") {
        fields.insert("timestamp".into(), value::timestamp(ts));
    }
    Ok(fields)
}

fn question_from_document(doc: Document) -> Option<Question> {
    let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
    let mut object = value::decode_fields(&doc.fields);
    object.retain(|_, v| !v.is_null());
    object.insert("id".into(), Value::String(id.clone()));

    match serde_json::from_value::<Question>(Value::Object(object)) {
        Ok(question) => Some(question),
        Err(e) => {
            tracing::warn!(document = %id, "skipping malformed question: {e}");
            None
        }
    }
}

#[async_trait]
impl QuestionRepository for FirestoreStore {
    #[instrument(skip(self))]
    async fn questions_for_role(&self, job_role: &str) -> Result<Vec<Question>> {
        let docs = self
            .run_query(json!({
                "from": [{ "collectionId": QUESTION_COLLECTION }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "jobRole" },
                        "op": "EQUAL",
                        "value": { "stringValue": job_role }
                    }
                }
            }))
            .await?;

        let questions: Vec<Question> = docs.into_iter().filter_map(question_from_document).collect();
        tracing::debug!(count = questions.len(), "questions fetched");
        Ok(questions)
    }

    #[instrument(skip(self))]
    async fn known_roles(&self) -> Result<Vec<String>> {
        let docs = self
            .run_query(json!({
                "from": [{ "collectionId": QUESTION_COLLECTION }],
                "select": { "fields": [{ "fieldPath": "jobRole" }] }
            }))
            .await?;

        let mut roles: Vec<String> = Vec::new();
        for doc in docs {
            if let Some(Value::String(role)) = doc.fields.get("jobRole").map(value::decode) {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
        }
        Ok(roles)
    }
}

#[async_trait]
impl AuditLog for FirestoreStore {
    async fn log_conversation(&self, record: &ConversationRecord) -> Result<()> {
        let fields = record_fields(record, &record.timestamp)?;
        self.add_document(["conversations", &record.user, &record.role], fields)
            .await
    }

    async fn log_score(&self, record: &ScoreRecord) -> Result<()> {
        let fields = record_fields(record, &record.timestamp)?;
        self.add_document(["scores", &record.user, &record.role], fields)
            .await
    }

    async fn log_final_score(&self, record: &FinalScoreRecord) -> Result<()> {
        let fields = record_fields(record, &record.timestamp)?;

        let mut url = self.url(["final_scores", record.user.as_str()])?;
        {
            let mut query = url.query_pairs_mut();
            for field in fields.keys() {
                query.append_pair("updateMask.fieldPaths", field);
            }
        }

        let req = self.client.patch(url).json(&json!({ "fields": fields }));
        self.send(req, "merge").await?;
        Ok(())
    }
}
