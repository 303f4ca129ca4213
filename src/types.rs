//! GitLab entity records.
//!
//! Plain serde records for the parts of the GitLab v4 API this client reads.
//! Every record is `#[serde(default)]` so missing keys decode to defaults and
//! unknown keys are ignored; keys GitLab sends as `null` are `Option`s.

use serde::{Deserialize, Serialize};

use crate::participants::unique_by;

/// A GitLab user as returned by `GET /users/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub public_email: Option<String>,
}

/// A merge request discussion thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Discussion {
    pub id: String,
    pub individual_note: bool,
    pub notes: Vec<Note>,
}

impl Discussion {
    /// Distinct note authors, in the order they first appear in the thread.
    pub fn participants(&self) -> Vec<NoteAuthor> {
        unique_by(self.notes.iter().map(|note| note.author.clone()), |author| {
            author.id
        })
    }
}

/// A single comment in a discussion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub body: String,
    pub author: NoteAuthor,
    pub created_at: String,
    pub updated_at: String,
    pub system: bool,
    pub noteable_id: u64,
    pub noteable_type: String,
    pub noteable_iid: u64,
    /// Only present on diff notes.
    pub position: Option<Position>,
    pub resolvable: bool,
    pub resolved: bool,
}

/// The author embedded in every note. `id` is its identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteAuthor {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub state: String,
    pub avatar_url: Option<String>,
    pub web_url: String,
}

/// Location of a diff note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub base_sha: String,
    pub start_sha: String,
    pub head_sha: String,
    pub old_path: String,
    pub new_path: String,
    pub position_type: String,
    pub old_line: Option<u64>,
    pub new_line: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: u64) -> NoteAuthor {
        NoteAuthor {
            id,
            username: format!("user{}", id),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_decodes_with_missing_and_unknown_fields() {
        let user: User =
            serde_json::from_str(r#"{"id": 5, "username": "root", "bot": false}"#).unwrap();
        assert_eq!(user.id, 5);
        assert_eq!(user.username, "root");
        assert_eq!(user.name, "");
        assert!(user.public_email.is_none());
    }

    #[test]
    fn test_user_decodes_null_public_email() {
        let user: User = serde_json::from_str(r#"{"id": 1, "public_email": null}"#).unwrap();
        assert!(user.public_email.is_none());

        let user: User =
            serde_json::from_str(r#"{"id": 1, "public_email": "a@example.com"}"#).unwrap();
        assert_eq!(user.public_email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_discussion_decodes_diff_note() {
        let json = r#"{
            "id": "6a9c1750b37d513a43987b574953fceb50b03ce7",
            "individual_note": false,
            "notes": [{
                "id": 1126,
                "type": "DiffNote",
                "body": "discussion text",
                "author": {"id": 1, "username": "root", "state": "active", "avatar_url": null},
                "system": false,
                "noteable_id": 3,
                "noteable_type": "MergeRequest",
                "noteable_iid": 7,
                "position": {
                    "base_sha": "b5d6e7b1",
                    "start_sha": "7c9c2ead",
                    "head_sha": "4803c71e",
                    "old_path": "package.json",
                    "new_path": "package.json",
                    "position_type": "text",
                    "old_line": null,
                    "new_line": 27
                },
                "resolvable": true,
                "resolved": false
            }]
        }"#;

        let discussion: Discussion = serde_json::from_str(json).unwrap();
        assert!(!discussion.individual_note);
        assert_eq!(discussion.notes.len(), 1);

        let note = &discussion.notes[0];
        assert_eq!(note.kind.as_deref(), Some("DiffNote"));
        assert_eq!(note.author.username, "root");
        assert_eq!(note.noteable_iid, 7);

        let position = note.position.as_ref().unwrap();
        assert_eq!(position.base_sha, "b5d6e7b1");
        assert_eq!(position.old_line, None);
        assert_eq!(position.new_line, Some(27));
    }

    #[test]
    fn test_discussion_decodes_individual_note_without_position() {
        let json = r#"{"id": "abc", "individual_note": true,
            "notes": [{"id": 1, "type": null, "author": {"id": 9}, "position": null}]}"#;

        let discussion: Discussion = serde_json::from_str(json).unwrap();
        assert!(discussion.individual_note);
        assert!(discussion.notes[0].kind.is_none());
        assert!(discussion.notes[0].position.is_none());
    }

    #[test]
    fn test_participants_are_distinct_in_first_seen_order() {
        let (a, b, c) = (author(1), author(2), author(3));
        let discussion = Discussion {
            notes: [&a, &a, &b, &c, &b]
                .into_iter()
                .map(|author| Note {
                    author: author.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        assert_eq!(discussion.participants(), vec![a, b, c]);
    }

    #[test]
    fn test_participants_of_empty_discussion() {
        assert!(Discussion::default().participants().is_empty());
    }
}
