//! Tantivy-based contact search.
//!
//! SQLite stays the source of truth; the index only maps free text to contact IDs
//! and is rebuilt from the database at startup.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Contact;

const BOOST_NAME: f32 = 10.0;
const BOOST_EMAIL: f32 = 8.0;
const BOOST_ORGANIZATION: f32 = 6.0;
const BOOST_TAGS: f32 = 5.0;
const BOOST_CITY: f32 = 3.0;
const BOOST_NOTES: f32 = 2.0;

/// Upper bound for a single page of search hits.
pub const MAX_SEARCH_LIMIT: usize = 100;
/// Deepest page start a search may request.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// A contact hit with its relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub contact_id: String,
    pub score: f32,
}

struct SearchFields {
    contact_id: Field,
    name: Field,
    email: Field,
    organization: Field,
    tags: Field,
    city: Field,
    notes: Field,
}

impl SearchFields {
    fn boosted(&self) -> [(Field, f32); 6] {
        [
            (self.name, BOOST_NAME),
            (self.email, BOOST_EMAIL),
            (self.organization, BOOST_ORGANIZATION),
            (self.tags, BOOST_TAGS),
            (self.city, BOOST_CITY),
            (self.notes, BOOST_NOTES),
        ]
    }
}

/// Full-text index over contacts.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open the index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let contact_id = schema_builder.add_text_field("contact_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT);
        let email = schema_builder.add_text_field("email", TEXT);
        let organization = schema_builder.add_text_field("organization", TEXT);
        let tags = schema_builder.add_text_field("tags", TEXT);
        let city = schema_builder.add_text_field("city", TEXT);
        let notes = schema_builder.add_text_field("notes", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            contact_id,
            name,
            email,
            organization,
            tags,
            city,
            notes,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000)
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with the given contacts.
    pub async fn rebuild(&self, contacts: &[Contact]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_all_documents()?;
        for contact in contacts {
            writer.add_document(self.document(contact))?;
        }
        writer.commit()?;
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} contacts", contacts.len());
        Ok(())
    }

    /// Add or replace a single contact.
    pub async fn index_contact(&self, contact: &Contact) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.fields.contact_id, &contact.id));
        writer.add_document(self.document(contact))?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Index several contacts with one commit.
    pub async fn index_contacts(&self, contacts: &[Contact]) -> Result<(), AppError> {
        if contacts.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.write().await;
        for contact in contacts {
            writer.delete_term(Term::from_field_text(self.fields.contact_id, &contact.id));
            writer.add_document(self.document(contact))?;
        }
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub async fn remove_contact(&self, contact_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.fields.contact_id, contact_id));
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Search contacts; `limit` is capped at [`MAX_SEARCH_LIMIT`], `offset` at [`MAX_SEARCH_OFFSET`].
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        let offset = offset.min(MAX_SEARCH_OFFSET);

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in self.fields.boosted() {
            // Lenient parsing: stray quotes or parentheses in user input are ignored.
            let (field_query, _errors) =
                QueryParser::for_index(&self.index, vec![field]).parse_query_lenient(query_str);
            subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
        }
        let query = BooleanQuery::new(subqueries);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit.saturating_add(offset)))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, address)| {
                let doc: TantivyDocument = searcher.doc(address).ok()?;
                let contact_id = doc.get_first(self.fields.contact_id)?.as_str()?.to_string();
                Some(SearchHit { contact_id, score })
            })
            .collect();

        Ok(hits)
    }

    fn document(&self, contact: &Contact) -> TantivyDocument {
        doc!(
            self.fields.contact_id => contact.id.clone(),
            self.fields.name => contact.display_name(),
            self.fields.email => contact.email.clone().unwrap_or_default(),
            self.fields.organization => contact.organization.clone().unwrap_or_default(),
            self.fields.tags => contact.tags.join(" "),
            self.fields.city => contact.city.clone().unwrap_or_default(),
            self.fields.notes => contact.notes.clone().unwrap_or_default()
        )
    }
}
