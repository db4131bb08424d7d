use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ellipse {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

/// One room of a layout. Its id is its position in [`ShipLayout::rooms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub listed_id: i32,
    pub x: i32,
    pub y: i32,
    pub squares_h: u32,
    pub squares_v: u32,
}

impl RoomInfo {
    pub fn square_count(&self) -> usize {
        self.squares_h as usize * self.squares_v as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DoorCoordinate {
    pub wall_x: i32,
    pub wall_y: i32,
    pub vertical: bool,
}

/// Rooms on either side of a door; -1 is open space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoorInfo {
    pub left_room: i32,
    pub right_room: i32,
}

/// Room and door geometry for one ship layout (`data/<id>.txt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipLayout {
    pub id: String,
    pub offset_x: i32,
    pub offset_y: i32,
    pub horizontal: i32,
    pub vertical: i32,
    pub ellipse: Option<Ellipse>,
    pub rooms: Vec<RoomInfo>,
    /// Doors in layout-file order; saved games store door records in this order.
    pub doors: Vec<(DoorCoordinate, DoorInfo)>,
}

impl ShipLayout {
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, id: usize) -> Option<&RoomInfo> {
        self.rooms.get(id)
    }

    pub fn door(&self, coordinate: DoorCoordinate) -> Option<&DoorInfo> {
        self.doors
            .iter()
            .find(|(c, _)| *c == coordinate)
            .map(|(_, info)| info)
    }

    /// Doors that open onto `room`, in stored order.
    pub fn doors_of(&self, room: i32) -> impl Iterator<Item = &(DoorCoordinate, DoorInfo)> {
        self.doors
            .iter()
            .filter(move |(_, info)| info.left_room == room || info.right_room == room)
    }
}

struct Lines<'a> {
    file: &'a str,
    lines: Vec<(usize, &'a str)>,
    next: usize,
    last_line: usize,
}

impl<'a> Lines<'a> {
    fn new(file: &'a str, text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();
        Self {
            file,
            lines,
            next: 0,
            last_line: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = *self.lines.get(self.next)?;
        self.next += 1;
        self.last_line = line.0;
        Some(line)
    }

    fn int(&mut self, what: &str) -> Result<i32> {
        let Some((line, text)) = self.next_line() else {
            return Err(self.error(self.last_line + 1, format!("missing {what}")));
        };
        text.parse::<i32>()
            .map_err(|_| self.error(line, format!("expected integer {what}, found {text:?}")))
    }

    fn size(&mut self, what: &str) -> Result<u32> {
        let value = self.int(what)?;
        u32::try_from(value)
            .map_err(|_| self.error(self.last_line, format!("{what} must not be negative, found {value}")))
    }

    fn skip_ints(&mut self) {
        while self
            .lines
            .get(self.next)
            .is_some_and(|(_, text)| text.parse::<i32>().is_ok())
        {
            self.next += 1;
        }
    }

    fn error(&self, line: usize, message: String) -> Error {
        Error::LayoutFormat {
            file: self.file.to_string(),
            line,
            message,
        }
    }
}

/// Parses the keyword/integer-lines layout grammar.
pub fn parse_layout(id: &str, file: &str, text: &str) -> Result<ShipLayout> {
    let mut layout = ShipLayout {
        id: id.to_string(),
        offset_x: 0,
        offset_y: 0,
        horizontal: 0,
        vertical: 0,
        ellipse: None,
        rooms: Vec::new(),
        doors: Vec::new(),
    };

    let mut lines = Lines::new(file, text);
    while let Some((line, keyword)) = lines.next_line() {
        match keyword {
            "X_OFFSET" => layout.offset_x = lines.int("x offset")?,
            "Y_OFFSET" => layout.offset_y = lines.int("y offset")?,
            "HORIZONTAL" => layout.horizontal = lines.int("horizontal shift")?,
            "VERTICAL" => layout.vertical = lines.int("vertical shift")?,
            "ELLIPSE" => {
                layout.ellipse = Some(Ellipse {
                    width: lines.int("ellipse width")?,
                    height: lines.int("ellipse height")?,
                    x: lines.int("ellipse x")?,
                    y: lines.int("ellipse y")?,
                });
            }
            "ROOM" => {
                let room = RoomInfo {
                    listed_id: lines.int("room id")?,
                    x: lines.int("room x")?,
                    y: lines.int("room y")?,
                    squares_h: lines.size("room width")?,
                    squares_v: lines.size("room height")?,
                };
                let position = layout.rooms.len();
                if usize::try_from(room.listed_id).ok() != Some(position) {
                    log::warn!(
                        "{file}:{line}: ROOM lists id {} but is room {position} by position",
                        room.listed_id
                    );
                }
                layout.rooms.push(room);
            }
            "DOOR" => {
                let wall_x = lines.int("door x")?;
                let wall_y = lines.int("door y")?;
                let info = DoorInfo {
                    left_room: lines.int("door left room")?,
                    right_room: lines.int("door right room")?,
                };
                let coordinate = DoorCoordinate {
                    wall_x,
                    wall_y,
                    vertical: lines.int("door orientation")? != 0,
                };
                match layout.doors.iter_mut().find(|(c, _)| *c == coordinate) {
                    Some(existing) => {
                        log::warn!("{file}:{line}: duplicate door at {coordinate:?}, keeping last");
                        existing.1 = info;
                    }
                    None => layout.doors.push((coordinate, info)),
                }
            }
            other => {
                log::warn!("{file}:{line}: skipping unknown layout keyword {other:?}");
                lines.skip_ints();
            }
        }
    }

    let room_count = i32::try_from(layout.rooms.len()).unwrap_or(i32::MAX);
    for (coordinate, info) in &layout.doors {
        for room in [info.left_room, info.right_room] {
            if room < -1 || room >= room_count {
                return Err(Error::LayoutFormat {
                    file: file.to_string(),
                    line: lines.last_line,
                    message: format!("door at {coordinate:?} references unknown room {room}"),
                });
            }
        }
    }

    Ok(layout)
}
