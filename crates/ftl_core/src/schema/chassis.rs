use serde::Serialize;

use crate::error::Result;

use super::xml::{bool_attr, int_attr, opt_int_attr, required_child};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageBounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaponMount {
    pub x: i32,
    pub y: i32,
    pub rotate: bool,
    pub mirror: bool,
    pub gib: Option<i32>,
    pub slide: Option<String>,
}

/// Hull image bounds and hardpoints for one ship (`data/<id>.xml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipChassis {
    pub id: String,
    pub image: ImageBounds,
    pub weapon_mounts: Vec<WeaponMount>,
    pub gib_count: usize,
}

pub fn parse_chassis(id: &str, file: &str, doc: &roxmltree::Document<'_>) -> Result<ShipChassis> {
    let root = doc.root_element();
    let img = required_child(file, root, "img")?;
    let image = ImageBounds {
        x: int_attr(file, img, "x")?,
        y: int_attr(file, img, "y")?,
        w: int_attr(file, img, "w")?,
        h: int_attr(file, img, "h")?,
    };

    let mut weapon_mounts = Vec::new();
    for mounts in root.children().filter(|n| n.has_tag_name("weaponMounts")) {
        for mount in mounts.children().filter(|n| n.has_tag_name("mount")) {
            weapon_mounts.push(WeaponMount {
                x: int_attr(file, mount, "x")?,
                y: int_attr(file, mount, "y")?,
                rotate: bool_attr(mount, "rotate"),
                mirror: bool_attr(mount, "mirror"),
                gib: opt_int_attr(file, mount, "gib")?,
                slide: mount.attribute("slide").map(str::to_string),
            });
        }
    }

    let gib_count = root
        .children()
        .find(|n| n.has_tag_name("explosion"))
        .map_or(0, |explosion| {
            explosion
                .children()
                .filter(|n| n.is_element() && n.tag_name().name().starts_with("gib"))
                .count()
        });

    Ok(ShipChassis {
        id: id.to_string(),
        image,
        weapon_mounts,
        gib_count,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_chassis;
    use crate::error::Error;
    use crate::text::prepare_xml;
    use crate::version::GameVersion;

    const KESTREL: &str = r#"<?xml version="1.0"?>
<img x="-71" y="-115" w="670" h="369"/>
<weaponMounts>
	<mount x="267" y="68" rotate="false" mirror="false" gib="5" slide="up"/>
	<mount x="268" y="238" rotate="false" mirror="true" gib="5" slide="down"/>
</weaponMounts>
<explosion>
	<gib1><velocity min="0.1" max="1"/></gib1>
	<gib2><velocity min="0.1" max="1"/></gib2>
</explosion>
"#;

    #[test]
    fn reads_bounds_mounts_and_gibs() {
        let prepared = prepare_xml("kestral.xml", GameVersion::default(), KESTREL);
        let doc = prepared.parse().expect("parses");
        let chassis = parse_chassis("kestral", "data/kestral.xml", &doc).expect("chassis");
        assert_eq!(chassis.image.w, 670);
        assert_eq!(chassis.weapon_mounts.len(), 2);
        assert!(chassis.weapon_mounts[1].mirror);
        assert_eq!(chassis.weapon_mounts[0].slide.as_deref(), Some("up"));
        assert_eq!(chassis.gib_count, 2);
    }

    #[test]
    fn missing_img_is_a_schema_error() {
        let prepared = prepare_xml("x.xml", GameVersion::default(), "<weaponMounts/>");
        let doc = prepared.parse().expect("parses");
        assert!(matches!(
            parse_chassis("x", "data/x.xml", &doc),
            Err(Error::SchemaFormat { .. })
        ));
    }
}
