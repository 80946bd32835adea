//! Website content: pages, blog posts, menus and contact form submissions.

use std::collections::{HashMap, HashSet};

use sqlx::Row;

use super::repository::{
    check_version, concurrent_modification, new_id, now, parse_json, parse_json_array, to_json,
    unique_violation, Repository,
};
use crate::errors::AppError;
use crate::models::{
    resolve_menu, validate_menu_items, validate_slug, BlogPost, ContactFormRequest,
    ContactSubmission, CreateMenuRequest, CreatePageRequest, CreatePostRequest, Menu, MenuItem,
    PublicMenu, SitePage, UpdateMenuRequest, UpdatePageRequest, UpdatePostRequest,
};

const PAGE_COLUMNS: &str = "id, slug, title, body, published, created_at, updated_at, version";
const POST_COLUMNS: &str =
    "id, slug, title, excerpt, body, author, tags, published_at, created_at, updated_at, version";
const MENU_COLUMNS: &str = "id, name, items, updated_at, version";
const SUBMISSION_COLUMNS: &str = "id, name, email, subject, message, created_at, handled";

impl Repository {
    // ==================== PAGE OPERATIONS ====================

    pub async fn list_pages(&self) -> Result<Vec<SitePage>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM site_pages ORDER BY slug", PAGE_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(page_from_row).collect())
    }

    pub async fn get_page(&self, id: &str) -> Result<Option<SitePage>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM site_pages WHERE id = ?", PAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(page_from_row))
    }

    /// A page as visitors see it: only when published.
    pub async fn get_published_page(&self, slug: &str) -> Result<Option<SitePage>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM site_pages WHERE slug = ? AND published = 1",
            PAGE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(page_from_row))
    }

    pub async fn create_page(&self, request: &CreatePageRequest) -> Result<SitePage, AppError> {
        validate_slug(&request.slug).map_err(AppError::Validation)?;
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("Page title is required".to_string()));
        }

        let timestamp = now();
        let page = SitePage {
            id: new_id(),
            slug: request.slug.clone(),
            title: request.title.trim().to_string(),
            body: request.body.clone(),
            published: request.published,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO site_pages (id, slug, title, body, published, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&page.id)
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.body)
        .bind(page.published as i32)
        .bind(&page.created_at)
        .bind(&page.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_taken(e, "page", &page.slug))?;

        self.increment_revision().await?;
        Ok(page)
    }

    pub async fn update_page(
        &self,
        id: &str,
        request: &UpdatePageRequest,
    ) -> Result<SitePage, AppError> {
        let existing = self
            .get_page(id)
            .await?
            .ok_or_else(|| AppError::not_found("Page", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = SitePage {
            slug: request.slug.clone().unwrap_or_else(|| existing.slug.clone()),
            title: request.title.clone().unwrap_or_else(|| existing.title.clone()),
            body: request.body.clone().unwrap_or_else(|| existing.body.clone()),
            published: request.published.unwrap_or(existing.published),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        validate_slug(&merged.slug).map_err(AppError::Validation)?;
        if merged.title.trim().is_empty() {
            return Err(AppError::Validation("Page title is required".to_string()));
        }

        let result = sqlx::query(
            "UPDATE site_pages SET slug = ?, title = ?, body = ?, published = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.slug)
        .bind(&merged.title)
        .bind(&merged.body)
        .bind(merged.published as i32)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_taken(e, "page", &merged.slug))?;

        if result.rows_affected() == 0 {
            let current = self.get_page(id).await?;
            return Err(concurrent_modification(current.map(|p| p.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete a page. Menu entries pointing at it disappear from the public menu.
    pub async fn delete_page(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM site_pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Page", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== POST OPERATIONS ====================

    /// All posts, drafts included, newest first.
    pub async fn list_posts(&self) -> Result<Vec<BlogPost>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM blog_posts ORDER BY created_at DESC",
            POST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Published posts, most recently published first.
    pub async fn list_published_posts(&self) -> Result<Vec<BlogPost>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM blog_posts WHERE published_at IS NOT NULL ORDER BY published_at DESC",
            POST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn get_post(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM blog_posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn get_published_post(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM blog_posts WHERE slug = ? AND published_at IS NOT NULL",
            POST_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Create a post as an unpublished draft.
    pub async fn create_post(&self, request: &CreatePostRequest) -> Result<BlogPost, AppError> {
        validate_slug(&request.slug).map_err(AppError::Validation)?;
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("Post title is required".to_string()));
        }

        let timestamp = now();
        let post = BlogPost {
            id: new_id(),
            slug: request.slug.clone(),
            title: request.title.trim().to_string(),
            excerpt: request.excerpt.clone(),
            body: request.body.clone(),
            author: request.author.clone(),
            tags: request.tags.clone(),
            published_at: None,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO blog_posts (id, slug, title, excerpt, body, author, tags, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.author)
        .bind(to_json(&post.tags)?)
        .bind(&post.created_at)
        .bind(&post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_taken(e, "post", &post.slug))?;

        self.increment_revision().await?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        id: &str,
        request: &UpdatePostRequest,
    ) -> Result<BlogPost, AppError> {
        let existing = self
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = BlogPost {
            slug: request.slug.clone().unwrap_or_else(|| existing.slug.clone()),
            title: request.title.clone().unwrap_or_else(|| existing.title.clone()),
            excerpt: request.excerpt.clone().or_else(|| existing.excerpt.clone()),
            body: request.body.clone().unwrap_or_else(|| existing.body.clone()),
            author: request.author.clone().or_else(|| existing.author.clone()),
            tags: request.tags.clone().unwrap_or_else(|| existing.tags.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        validate_slug(&merged.slug).map_err(AppError::Validation)?;
        if merged.title.trim().is_empty() {
            return Err(AppError::Validation("Post title is required".to_string()));
        }

        self.write_post(&merged, existing.version).await?;
        Ok(merged)
    }

    /// Publish a post now, or unpublish it.
    pub async fn set_post_published(&self, id: &str, published: bool) -> Result<BlogPost, AppError> {
        let existing = self
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", id))?;

        let timestamp = now();
        let post = BlogPost {
            published_at: published.then(|| timestamp.clone()),
            updated_at: timestamp,
            version: existing.version + 1,
            ..existing.clone()
        };

        self.write_post(&post, existing.version).await?;
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Post", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    async fn write_post(&self, post: &BlogPost, previous_version: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE blog_posts SET slug = ?, title = ?, excerpt = ?, body = ?, author = ?, tags = ?, published_at = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.author)
        .bind(to_json(&post.tags)?)
        .bind(&post.published_at)
        .bind(&post.updated_at)
        .bind(post.version)
        .bind(&post.id)
        .bind(previous_version)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_taken(e, "post", &post.slug))?;

        if result.rows_affected() == 0 {
            let current = self.get_post(&post.id).await?;
            return Err(concurrent_modification(current.map(|p| p.version)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== MENU OPERATIONS ====================

    pub async fn list_menus(&self) -> Result<Vec<Menu>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM menus ORDER BY name", MENU_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(menu_from_row).collect())
    }

    pub async fn get_menu(&self, id: &str) -> Result<Option<Menu>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM menus WHERE id = ?", MENU_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(menu_from_row))
    }

    pub async fn create_menu(&self, request: &CreateMenuRequest) -> Result<Menu, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Menu name is required".to_string()));
        }
        self.check_menu_items(&request.items).await?;

        let menu = Menu {
            id: new_id(),
            name: name.to_string(),
            items: request.items.clone(),
            updated_at: now(),
            version: 1,
        };

        sqlx::query("INSERT INTO menus (id, name, items, updated_at, version) VALUES (?, ?, ?, ?, 1)")
            .bind(&menu.id)
            .bind(&menu.name)
            .bind(to_json(&menu.items)?)
            .bind(&menu.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                unique_violation(e, || format!("A menu named {:?} already exists", menu.name))
            })?;

        self.increment_revision().await?;
        Ok(menu)
    }

    pub async fn update_menu(&self, id: &str, request: &UpdateMenuRequest) -> Result<Menu, AppError> {
        let existing = self
            .get_menu(id)
            .await?
            .ok_or_else(|| AppError::not_found("Menu", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = Menu {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.name.clone()),
            items: request.items.clone().unwrap_or_else(|| existing.items.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        if merged.name.is_empty() {
            return Err(AppError::Validation("Menu name is required".to_string()));
        }
        self.check_menu_items(&merged.items).await?;

        let result = sqlx::query(
            "UPDATE menus SET name = ?, items = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.name)
        .bind(to_json(&merged.items)?)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, || format!("A menu named {:?} already exists", merged.name)))?;

        if result.rows_affected() == 0 {
            let current = self.get_menu(id).await?;
            return Err(concurrent_modification(current.map(|m| m.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    pub async fn delete_menu(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM menus WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Menu", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// A menu by name with page links resolved against published pages.
    pub async fn get_public_menu(&self, name: &str) -> Result<Option<PublicMenu>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM menus WHERE name = ?", MENU_COLUMNS))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        let Some(menu) = row.as_ref().map(menu_from_row) else {
            return Ok(None);
        };

        let slugs: HashMap<String, String> =
            sqlx::query("SELECT id, slug FROM site_pages WHERE published = 1")
                .fetch_all(&self.pool)
                .await?
                .iter()
                .map(|row| (row.get("id"), row.get("slug")))
                .collect();

        Ok(Some(PublicMenu {
            name: menu.name,
            items: resolve_menu(&menu.items, &|page_id: &str| slugs.get(page_id).cloned()),
        }))
    }

    async fn check_menu_items(&self, items: &[MenuItem]) -> Result<(), AppError> {
        let page_ids: HashSet<String> = sqlx::query("SELECT id FROM site_pages")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.get("id"))
            .collect();
        validate_menu_items(items, &|page_id: &str| page_ids.contains(page_id))
            .map_err(AppError::Validation)
    }

    // ==================== CONTACT FORM OPERATIONS ====================

    /// Store a contact form submission from the public site.
    pub async fn create_submission(
        &self,
        form: &ContactFormRequest,
    ) -> Result<ContactSubmission, AppError> {
        form.validate().map_err(AppError::Validation)?;

        let submission = ContactSubmission {
            id: new_id(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            subject: form
                .subject
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            message: form.message.clone(),
            created_at: now(),
            handled: false,
        };

        sqlx::query(
            "INSERT INTO contact_submissions (id, name, email, subject, message, created_at, handled) VALUES (?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(&submission.id)
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(&submission.created_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(submission)
    }

    /// Submissions, unhandled first, newest first within each group.
    pub async fn list_submissions(&self) -> Result<Vec<ContactSubmission>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contact_submissions ORDER BY handled, created_at DESC",
            SUBMISSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(submission_from_row).collect())
    }

    pub async fn set_submission_handled(
        &self,
        id: &str,
        handled: bool,
    ) -> Result<ContactSubmission, AppError> {
        let result = sqlx::query("UPDATE contact_submissions SET handled = ? WHERE id = ?")
            .bind(handled as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Submission", id));
        }
        self.increment_revision().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM contact_submissions WHERE id = ?",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(submission_from_row(&row))
    }

    pub async fn delete_submission(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contact_submissions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Submission", id));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

fn slug_taken(err: sqlx::Error, kind: &str, slug: &str) -> AppError {
    unique_violation(err, || format!("Another {} already uses the slug {:?}", kind, slug))
}

fn page_from_row(row: &sqlx::sqlite::SqliteRow) -> SitePage {
    SitePage {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        body: row.get("body"),
        published: row.get::<i32, _>("published") != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn post_from_row(row: &sqlx::sqlite::SqliteRow) -> BlogPost {
    BlogPost {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        body: row.get("body"),
        author: row.get("author"),
        tags: parse_json_array(row.get("tags")),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn menu_from_row(row: &sqlx::sqlite::SqliteRow) -> Menu {
    Menu {
        id: row.get("id"),
        name: row.get("name"),
        items: parse_json(row.get("items")),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn submission_from_row(row: &sqlx::sqlite::SqliteRow) -> ContactSubmission {
    ContactSubmission {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        subject: row.get("subject"),
        message: row.get("message"),
        created_at: row.get("created_at"),
        handled: row.get::<i32, _>("handled") != 0,
    }
}
