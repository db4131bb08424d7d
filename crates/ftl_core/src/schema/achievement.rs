use serde::Serialize;

use crate::error::Result;

use super::xml::{child_int, child_text, required_attr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub img: Option<String>,
    /// Ship blueprint this is a ship-specific achievement for.
    pub ship: Option<String>,
    pub multi_difficulty: bool,
}

pub fn parse_achievements(file: &str, doc: &roxmltree::Document<'_>) -> Result<Vec<Achievement>> {
    doc.root_element()
        .children()
        .filter(|n| n.has_tag_name("achievement"))
        .map(|node| {
            Ok(Achievement {
                id: required_attr(file, node, "id")?.to_string(),
                name: child_text(node, "name"),
                description: child_text(node, "desc"),
                img: child_text(node, "img"),
                ship: child_text(node, "ship"),
                multi_difficulty: child_int(file, node, "multiDifficulty")?.is_some_and(|v| v != 0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_achievements;
    use crate::text::prepare_xml;
    use crate::version::GameVersion;

    #[test]
    fn reads_entries_after_dropping_bogus_comment() {
        let text = "<!-- Achievements\n\
<achievement id=\"ACH_SECTOR_5\">\n\
\t<name>Sector 5</name>\n\
\t<desc>Reach sector 5.</desc>\n\
\t<img>achievements/sector5.png</img>\n\
\t<multiDifficulty>1</multiDifficulty>\n\
</achievement>\n\
<achievement id=\"ACH_KESTREL_1\"><ship>PLAYER_SHIP_HARD</ship></achievement>\n";
        let prepared = prepare_xml("achievements.xml", GameVersion::default(), text);
        let doc = prepared.parse().expect("parses");
        let all = parse_achievements("data/achievements.xml", &doc).expect("achievements");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name.as_deref(), Some("Sector 5"));
        assert!(all[0].multi_difficulty);
        assert!(!all[1].multi_difficulty);
        assert_eq!(all[1].ship.as_deref(), Some("PLAYER_SHIP_HARD"));
    }
}
