use serde::Serialize;

use crate::error::Result;

use super::xml::{bool_attr, child, child_int, child_text, int_attr, opt_int_attr, required_attr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSlot {
    pub id: String,
    pub power: i32,
    pub max: Option<i32>,
    pub room: Option<i32>,
    pub start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewCount {
    pub race: String,
    pub amount: i32,
}

/// A `<shipBlueprint>` entry from `blueprints.xml` or `autoBlueprints.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipBlueprint {
    pub id: String,
    pub layout: String,
    pub img: String,
    pub class_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub systems: Vec<SystemSlot>,
    pub weapon_slots: Option<i32>,
    pub drone_slots: Option<i32>,
    pub health: Option<i32>,
    pub max_power: Option<i32>,
    pub crew: Vec<CrewCount>,
    pub weapons: Vec<String>,
    pub augments: Vec<String>,
}

pub fn parse_ship_blueprints(file: &str, doc: &roxmltree::Document<'_>) -> Result<Vec<ShipBlueprint>> {
    doc.root_element()
        .children()
        .filter(|n| n.has_tag_name("shipBlueprint"))
        .map(|node| parse_one(file, node))
        .collect()
}

fn parse_one(file: &str, node: roxmltree::Node<'_, '_>) -> Result<ShipBlueprint> {
    let id = required_attr(file, node, "name")?.to_string();
    let layout = required_attr(file, node, "layout")?.to_string();
    let img = node
        .attribute("img")
        .map_or_else(|| layout.clone(), str::to_string);

    let mut systems = Vec::new();
    if let Some(list) = child(node, "systemList") {
        for system in list.children().filter(|n| n.is_element()) {
            systems.push(SystemSlot {
                id: system.tag_name().name().to_string(),
                power: int_attr(file, system, "power")?,
                max: opt_int_attr(file, system, "max")?,
                room: opt_int_attr(file, system, "room")?,
                start: system.attribute("start").is_none() || bool_attr(system, "start"),
            });
        }
    }

    let mut crew = Vec::new();
    for count in node.children().filter(|n| n.has_tag_name("crewCount")) {
        crew.push(CrewCount {
            race: count.attribute("class").unwrap_or("human").to_string(),
            amount: int_attr(file, count, "amount")?,
        });
    }

    let weapons = child(node, "weaponList")
        .map(|list| named_children(list, "weapon"))
        .unwrap_or_default();
    let augments = node
        .children()
        .filter(|n| n.has_tag_name("aug"))
        .filter_map(|n| n.attribute("name").map(str::to_string))
        .collect();

    Ok(ShipBlueprint {
        id,
        layout,
        img,
        class_name: child_text(node, "class"),
        name: child_text(node, "name"),
        description: child_text(node, "desc"),
        systems,
        weapon_slots: child_int(file, node, "weaponSlots")?,
        drone_slots: child_int(file, node, "droneSlots")?,
        health: amount_of(file, node, "health")?,
        max_power: amount_of(file, node, "maxPower")?,
        crew,
        weapons,
        augments,
    })
}

fn named_children(list: roxmltree::Node<'_, '_>, tag: &str) -> Vec<String> {
    list.children()
        .filter(|n| n.has_tag_name(tag))
        .filter_map(|n| n.attribute("name").map(str::to_string))
        .collect()
}

fn amount_of(file: &str, node: roxmltree::Node<'_, '_>, tag: &str) -> Result<Option<i32>> {
    match child(node, tag) {
        Some(element) => opt_int_attr(file, element, "amount"),
        None => Ok(None),
    }
}
