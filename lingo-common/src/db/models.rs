//! Database models
//!
//! Row structs map one-to-one onto the tables created in [`super::init`].
//! Timestamps are epoch milliseconds.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::access::Role;

/// Raw `users` row. `role` is kept as text here and parsed by
/// [`UserRow::into_user`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRow {
    pub fn into_user(self) -> crate::Result<User> {
        Ok(User {
            role: self.role.parse()?,
            id: self.id,
            name: self.name,
            email: self.email,
            email_verified: self.email_verified,
            image: self.image,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// User as exposed to handlers and API responses (no password hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub language_code: String,
    pub title: String,
    pub description: String,
    pub level: String,
    pub category: String,
    pub flag: Option<String>,
    pub duration: Option<String>,
    pub students: i64,
    pub rating_tenths: i64,
    pub total_lessons: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourseModule {
    pub id: i64,
    pub course_id: String,
    pub position: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub module_id: i64,
    pub position: i64,
    pub title: String,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub lesson_type: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VocabularyItem {
    pub id: i64,
    pub course_id: String,
    pub word: String,
    pub translation: String,
    pub part_of_speech: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GrammarTopic {
    pub id: i64,
    pub course_id: String,
    pub title: String,
    pub content: String,
    pub example: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CulturalContent {
    pub id: i64,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuizQuestion {
    pub id: i64,
    pub course_id: String,
    pub question: String,
    pub options_json: String,
    pub correct_index: i64,
    pub question_type: String,
    pub created_at: i64,
}

impl QuizQuestion {
    /// Decode `options_json`; anything other than a JSON array of strings
    /// yields an empty list
    pub fn options(&self) -> Vec<String> {
        serde_json::from_str::<Vec<String>>(&self.options_json).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProgress {
    pub id: i64,
    pub user_id: String,
    pub language_code: String,
    pub words_learned: i64,
    pub lessons_completed: i64,
    pub quizzes_passed: i64,
    pub current_streak: i64,
    pub last_practice_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QuizResult {
    pub id: i64,
    pub user_id: String,
    pub language_code: String,
    pub quiz_type: String,
    pub score: i64,
    pub total_questions: i64,
    pub completed_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LearnedWord {
    pub id: i64,
    pub user_id: String,
    pub language_code: String,
    pub word: String,
    pub translation: String,
    pub learned_at: i64,
    pub times_reviewed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserCourseProgress {
    pub id: i64,
    pub user_id: String,
    pub course_id: String,
    pub completed_lessons: i64,
    pub last_lesson_id: Option<i64>,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options_json: &str) -> QuizQuestion {
        QuizQuestion {
            id: 1,
            course_id: "spanish-beginners".to_string(),
            question: "How do you say hello?".to_string(),
            options_json: options_json.to_string(),
            correct_index: 0,
            question_type: "vocabulary".to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn test_quiz_options_decode() {
        assert_eq!(question(r#"["hola","adiós"]"#).options(), vec!["hola", "adiós"]);
    }

    #[test]
    fn test_quiz_options_invalid_json_is_empty() {
        assert!(question("not json").options().is_empty());
        assert!(question(r#"{"a":1}"#).options().is_empty());
    }

    #[test]
    fn test_user_row_rejects_unknown_role() {
        let row = UserRow {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            email_verified: false,
            image: None,
            role: "root".to_string(),
            is_active: true,
            password_hash: String::new(),
            created_at: 0,
            updated_at: 0,
        };
        assert!(row.into_user().is_err());
    }
}
