//! Public website content: pages, blog posts, menus and contact form submissions.

use serde::{Deserialize, Serialize};

use super::contact::is_plausible_email;

/// Menus may nest at most this deep.
pub const MAX_MENU_DEPTH: usize = 3;
/// Longest accepted contact form message, in characters.
pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePage {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// A navigation entry: either an external/absolute URL or a link to a site page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuRequest {
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<MenuItem>>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Menu as served to visitors: page links resolved to paths.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenuItem {
    pub label: String,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PublicMenuItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenu {
    pub name: String,
    pub items: Vec<PublicMenuItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
    pub created_at: String,
    pub handled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactFormRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if !is_plausible_email(&self.email) {
            return Err("A valid email address is required".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("Message is required".to_string());
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(format!(
                "Message must not exceed {} characters",
                MAX_MESSAGE_LEN
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmissionRequest {
    pub handled: bool,
}

/// Slugs are lowercase ASCII words joined by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), String> {
    let valid = !slug.is_empty()
        && slug.len() <= 120
        && slug
            .split('-')
            .all(|word| {
                !word.is_empty()
                    && word
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            });
    if valid {
        Ok(())
    } else {
        Err(format!(
            "Invalid slug {:?}: use lowercase letters, digits and single hyphens",
            slug
        ))
    }
}

/// Check structure of menu items; page existence is checked by the caller through `page_exists`.
pub fn validate_menu_items(
    items: &[MenuItem],
    page_exists: &dyn Fn(&str) -> bool,
) -> Result<(), String> {
    fn walk(
        items: &[MenuItem],
        depth: usize,
        page_exists: &dyn Fn(&str) -> bool,
    ) -> Result<(), String> {
        if items.is_empty() {
            return Ok(());
        }
        if depth > MAX_MENU_DEPTH {
            return Err(format!("Menus may nest at most {} levels", MAX_MENU_DEPTH));
        }
        for item in items {
            if item.label.trim().is_empty() {
                return Err("Menu item label is required".to_string());
            }
            match (&item.url, &item.page_id) {
                (Some(_), Some(_)) | (None, None) => {
                    return Err(format!(
                        "Menu item {:?} needs exactly one of url or pageId",
                        item.label
                    ))
                }
                (None, Some(page_id)) if !page_exists(page_id.as_str()) => {
                    return Err(format!("Menu item {:?} links to unknown page {}", item.label, page_id))
                }
                _ => {}
            }
            walk(&item.children, depth + 1, page_exists)?;
        }
        Ok(())
    }
    walk(items, 1, page_exists)
}

/// Resolve page links to `/{slug}`; links to unpublished or missing pages are dropped with their children.
pub fn resolve_menu(
    items: &[MenuItem],
    published_slug: &dyn Fn(&str) -> Option<String>,
) -> Vec<PublicMenuItem> {
    items
        .iter()
        .filter_map(|item| {
            let url = match (&item.url, &item.page_id) {
                (Some(url), _) => url.clone(),
                (None, Some(page_id)) => format!("/{}", published_slug(page_id.as_str())?),
                (None, None) => return None,
            };
            Some(PublicMenuItem {
                label: item.label.clone(),
                url,
                children: resolve_menu(&item.children, published_slug),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(label: &str, url: &str) -> MenuItem {
        MenuItem {
            label: label.into(),
            url: Some(url.into()),
            page_id: None,
            children: vec![],
        }
    }

    fn page_link(label: &str, page_id: &str, children: Vec<MenuItem>) -> MenuItem {
        MenuItem {
            label: label.into(),
            url: None,
            page_id: Some(page_id.into()),
            children,
        }
    }

    #[test]
    fn test_slugs() {
        assert!(validate_slug("about").is_ok());
        assert!(validate_slug("summer-fest-2026").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("About").is_err());
        assert!(validate_slug("double--hyphen").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("with space").is_err());
        assert!(validate_slug("umlaut-ü").is_err());
    }

    #[test]
    fn test_menu_validation() {
        let exists = |id: &str| id == "p1";
        assert!(validate_menu_items(&[link("Home", "/"), page_link("About", "p1", vec![])], &exists).is_ok());

        let both = MenuItem {
            page_id: Some("p1".into()),
            ..link("Both", "/x")
        };
        assert!(validate_menu_items(&[both], &exists).is_err());
        assert!(validate_menu_items(&[page_link("Ghost", "p9", vec![])], &exists).is_err());

        let deep = page_link(
            "1",
            "p1",
            vec![page_link("2", "p1", vec![page_link("3", "p1", vec![link("4", "/4")])])],
        );
        assert!(validate_menu_items(&[deep], &exists).is_err());
    }

    #[test]
    fn test_resolve_menu_drops_unpublished_branches() {
        let slugs = |id: &str| match id {
            "p1" => Some("about".to_string()),
            _ => None,
        };
        let items = vec![
            link("Home", "/"),
            page_link("About", "p1", vec![link("Board", "/about#board")]),
            page_link("Draft", "p2", vec![link("Hidden", "/hidden")]),
        ];

        let resolved = resolve_menu(&items, &slugs);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].url, "/about");
        assert_eq!(resolved[1].children[0].label, "Board");
    }

    #[test]
    fn test_contact_form_validation() {
        let form = ContactFormRequest {
            name: "Visitor".into(),
            email: "visitor@example.org".into(),
            subject: None,
            message: "Hello".into(),
        };
        assert!(form.validate().is_ok());

        let long = ContactFormRequest {
            message: "x".repeat(MAX_MESSAGE_LEN + 1),
            ..form.clone()
        };
        assert!(long.validate().is_err());

        let bad_email = ContactFormRequest {
            email: "nope".into(),
            ..form
        };
        assert!(bad_email.validate().is_err());
    }
}
