//! Built-in collection table.

use crate::search::{Clause, Ranking, RangeOp};

use super::index_config::{IndexConfig, MappingKind};

/// Search configs for every built-in collection
pub fn standard_configs() -> Vec<IndexConfig> {
    vec![comments(), posts(), users(), sequences(), tags()]
}

fn comments() -> IndexConfig {
    IndexConfig::new("Comments")
        .field("body")
        .field("authorDisplayName")
        .snippet("body")
        .highlight("authorDisplayName")
        .rank(Ranking::numeric("baseScore", 20))
        .tiebreaker("publicDateMs")
        .filter(Clause::term("deleted", false))
        .filter(Clause::term("rejected", false))
        .filter(Clause::term("authorIsUnreviewed", false))
        .filter(Clause::term("retracted", false))
        .filter(Clause::term("spam", false))
        .mapping("body", MappingKind::FullText)
        .mapping("authorDisplayName", MappingKind::FullText)
        .mapping("authorSlug", MappingKind::Keyword)
        .mapping("tags", MappingKind::Nested)
        .private_field("authorIsUnreviewed")
        .private_field("deleted")
        .private_field("rejected")
        .private_field("retracted")
        .private_field("spam")
}

fn posts() -> IndexConfig {
    IndexConfig::new("Posts")
        .field("title^3")
        .field("authorDisplayName^4")
        .field("body")
        .snippet("body")
        .highlight("title")
        .rank(Ranking::numeric("baseScore", 20).weight(8.0))
        .rank(Ranking::boolean("curated"))
        .rank(Ranking::boolean("frontpage"))
        .tiebreaker("publicDateMs")
        .filter(Clause::term("isFuture", false))
        .filter(Clause::term("draft", false))
        .filter(Clause::term("unlisted", false))
        .filter(Clause::term("rejected", false))
        .filter(Clause::term("authorIsUnreviewed", false))
        .filter(Clause::term("status", 2i64))
        .filter(Clause::range("baseScore", RangeOp::Gte, 0.0))
        .mapping("title", MappingKind::FullText)
        .mapping("body", MappingKind::FullText)
        .mapping("authorDisplayName", MappingKind::FullText)
        .mapping("authorSlug", MappingKind::Keyword)
        .mapping("url", MappingKind::Keyword)
        .mapping("tags", MappingKind::Nested)
        .private_field("authorIsUnreviewed")
        .private_field("draft")
        .private_field("isFuture")
        .private_field("rejected")
        .private_field("unlisted")
        .private_field("status")
}

fn users() -> IndexConfig {
    IndexConfig::new("Users")
        .field("displayName^10")
        .field("bio")
        .field("mapLocationAddress")
        .field("jobTitle")
        .field("organization")
        .snippet("bio")
        .highlight("displayName")
        .rank(Ranking::numeric("karma", 4000))
        .tiebreaker("publicDateMs")
        .filter(Clause::term("deleted", false))
        .filter(Clause::term("deleteContent", false))
        .mapping("displayName", MappingKind::FullText)
        .mapping("bio", MappingKind::FullText)
        .mapping("slug", MappingKind::Keyword)
        .mapping("profileTags", MappingKind::Nested)
        .karma_field("karma")
        .location_field("_geoloc")
        .private_field("deleteContent")
        .private_field("deleted")
        .private_field("isAdmin")
        .private_field("hideFromPeopleDirectory")
}

fn sequences() -> IndexConfig {
    IndexConfig::new("Sequences")
        .field("title^3")
        .field("authorDisplayName")
        .field("plaintextDescription")
        .snippet("plaintextDescription")
        .highlight("title")
        .rank(Ranking::date("createdAt"))
        .tiebreaker("publicDateMs")
        .filter(Clause::term("isDeleted", false))
        .filter(Clause::term("draft", false))
        .filter(Clause::term("hidden", false))
        .mapping("title", MappingKind::FullText)
        .mapping("plaintextDescription", MappingKind::FullText)
        .mapping("authorSlug", MappingKind::Keyword)
        .private_field("isDeleted")
        .private_field("draft")
        .private_field("hidden")
}

fn tags() -> IndexConfig {
    IndexConfig::new("Tags")
        .field("name^3")
        .field("description")
        .snippet("description")
        .highlight("name")
        .rank(Ranking::boolean("core"))
        .rank(Ranking::numeric("postCount", 10))
        .tiebreaker("postCount")
        .filter(Clause::term("deleted", false))
        .filter(Clause::term("adminOnly", false))
        .mapping("name", MappingKind::FullText)
        .mapping("description", MappingKind::FullText)
        .mapping("slug", MappingKind::Keyword)
        .karma_field("postCount")
        .private_field("deleted")
        .private_field("adminOnly")
}
