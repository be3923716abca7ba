//! Declarative invalidation table.
//!
//! Maps each mutable resource to the cache-key prefixes its mutations can
//! affect: the resource's own collection/detail keys, any derived
//! aggregates (dashboard counts, new-users list), and the views of other
//! resources its writes reach — through joins (class names in user rows,
//! questions embedded in the quiz-by-chapter view) or through foreign-key
//! cascades (deleting a category deletes its quizzes and questions).
//! Mutating handlers go through `ResponseCache::invalidate_resource`, so
//! the dependency set for a mutation lives here and nowhere else.

/// A mutable resource whose writes invalidate cached reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Admins,
    Classes,
    Subjects,
    Chapters,
    Categories,
    Quizzes,
    Questions,
    QuizRecords,
    Settings,
}

/// Chapter mutations transitively affect subject, quiz and listing views;
/// their dependency set is too large to enumerate, so they drop the whole
/// cache instead.
pub fn flushes_everything(resource: Resource) -> bool {
    matches!(resource, Resource::Chapters)
}

/// Cache-key prefixes affected by a mutation on `resource`.
pub fn dependent_prefixes(resource: Resource) -> &'static [&'static str] {
    match resource {
        // Deleting a user cascades its quiz records, so reports change too.
        Resource::Users => &[
            "/api/auth/users",
            "/api/auth/admins",
            "/api/dashboard/stats",
            "/api/dashboard/new-users",
            "/api/reports",
        ],
        Resource::Admins => &["/api/auth/admins", "/api/dashboard/stats"],
        // Class names are joined into user listings; deleting a class
        // cascades its subjects and their chapters, and detaches quizzes.
        Resource::Classes => &[
            "/api/classes",
            "/api/subjects",
            "/api/chapters",
            "/api/quizzes",
            "/api/auth/users",
            "/api/dashboard/new-users",
            "/api/dashboard/stats",
        ],
        // Subject names appear in chapter detail views; deleting a subject
        // cascades its chapters and detaches quizzes.
        Resource::Subjects => &[
            "/api/subjects",
            "/api/chapters",
            "/api/quizzes",
            "/api/dashboard/stats",
        ],
        // Unreachable through invalidate_resource; kept total for callers
        // that enumerate the table directly.
        Resource::Chapters => &["/api/chapters", "/api/quizzes", "/api/dashboard/stats"],
        // Deleting a category cascades its quizzes and questions.
        Resource::Categories => &[
            "/api/categories",
            "/api/quizzes",
            "/api/questions",
            "/api/dashboard/stats",
        ],
        // Deleting a quiz cascades its records, which feed the reports.
        Resource::Quizzes => &["/api/quizzes", "/api/reports", "/api/dashboard/stats"],
        // The quiz-by-chapter view embeds the category's question set, and
        // it lives under the quizzes prefix.
        Resource::Questions => &["/api/questions", "/api/quizzes", "/api/dashboard/stats"],
        Resource::QuizRecords => &["/api/quiz-records", "/api/reports"],
        Resource::Settings => &["/api/settings"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Resource; 10] = [
        Resource::Users,
        Resource::Admins,
        Resource::Classes,
        Resource::Subjects,
        Resource::Chapters,
        Resource::Categories,
        Resource::Quizzes,
        Resource::Questions,
        Resource::QuizRecords,
        Resource::Settings,
    ];

    #[test]
    fn every_resource_has_a_dependency_set() {
        for resource in ALL {
            assert!(
                !dependent_prefixes(resource).is_empty(),
                "{resource:?} has no dependency set"
            );
        }
    }

    #[test]
    fn aggregates_depend_on_their_source_collections() {
        // Dashboard stats count users, classes, subjects, quizzes and
        // questions; each of those mutations must reach the stats key.
        for resource in [
            Resource::Users,
            Resource::Classes,
            Resource::Subjects,
            Resource::Quizzes,
            Resource::Questions,
        ] {
            assert!(
                dependent_prefixes(resource).contains(&"/api/dashboard/stats"),
                "{resource:?} does not invalidate dashboard stats"
            );
        }
    }

    #[test]
    fn question_mutations_reach_embedded_quiz_views() {
        // The quiz-by-chapter view serves the category's questions, keyed
        // under the quizzes prefix.
        assert!(dependent_prefixes(Resource::Questions).contains(&"/api/quizzes"));
    }

    #[test]
    fn category_mutations_cover_their_cascades() {
        // categories -> quizzes and categories -> questions are ON DELETE
        // CASCADE edges.
        let prefixes = dependent_prefixes(Resource::Categories);
        assert!(prefixes.contains(&"/api/quizzes"));
        assert!(prefixes.contains(&"/api/questions"));
    }

    #[test]
    fn class_mutations_reach_joined_and_cascaded_views() {
        // Class names are joined into user listings and the new-users
        // panel; subjects and chapters hang off a class.
        let prefixes = dependent_prefixes(Resource::Classes);
        assert!(prefixes.contains(&"/api/auth/users"));
        assert!(prefixes.contains(&"/api/dashboard/new-users"));
        assert!(prefixes.contains(&"/api/subjects"));
        assert!(prefixes.contains(&"/api/chapters"));
    }

    #[test]
    fn record_holders_reach_the_reports() {
        // Deleting a user or a quiz cascades its quiz records.
        assert!(dependent_prefixes(Resource::Users).contains(&"/api/reports"));
        assert!(dependent_prefixes(Resource::Quizzes).contains(&"/api/reports"));
    }

    #[test]
    fn only_chapters_take_the_blanket_flush() {
        for resource in ALL {
            assert_eq!(
                flushes_everything(resource),
                resource == Resource::Chapters,
                "{resource:?}"
            );
        }
    }
}
