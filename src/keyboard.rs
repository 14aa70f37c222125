use std::collections::HashMap;

/// The fixed coloring palette offered to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PaletteColor {
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Orange,
    Purple,
}

pub const PALETTE: [PaletteColor; 7] = [
    PaletteColor::Pink,
    PaletteColor::Blue,
    PaletteColor::Red,
    PaletteColor::Green,
    PaletteColor::Yellow,
    PaletteColor::Orange,
    PaletteColor::Purple,
];

impl PaletteColor {
    /// Crayon-soft RGB values for rendering.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            PaletteColor::Pink => (0xFF, 0xC0, 0xCB),
            PaletteColor::Blue => (0xAD, 0xD8, 0xE6),
            PaletteColor::Red => (0xFF, 0xB6, 0xC1),
            PaletteColor::Green => (0x90, 0xEE, 0x90),
            PaletteColor::Yellow => (0xFF, 0xFF, 0xE0),
            PaletteColor::Orange => (0xFF, 0xA0, 0x7A),
            PaletteColor::Purple => (0xD8, 0xBF, 0xD8),
        }
    }
}

/// One selectable key region of the diagram.
#[derive(Debug, Clone, Copy)]
pub struct KeyRegion {
    pub id: &'static str,
    pub label: &'static str,
    pub width: u16,
    pub row: usize,
}

const fn key(id: &'static str, label: &'static str, width: u16, row: usize) -> KeyRegion {
    KeyRegion {
        id,
        label,
        width,
        row,
    }
}

/// The diagram's key layout, row by row.
pub static KEY_MAP: &[KeyRegion] = &[
    key("1", "1", 3, 0),
    key("2", "2", 3, 0),
    key("3", "3", 3, 0),
    key("4", "4", 3, 0),
    key("5", "5", 3, 0),
    key("6", "6", 3, 0),
    key("7", "7", 3, 0),
    key("8", "8", 3, 0),
    key("9", "9", 3, 0),
    key("0", "0", 3, 0),
    key("backspace", "BKSP", 6, 0),
    key("q", "Q", 3, 1),
    key("w", "W", 3, 1),
    key("e", "E", 3, 1),
    key("r", "R", 3, 1),
    key("t", "T", 3, 1),
    key("y", "Y", 3, 1),
    key("u", "U", 3, 1),
    key("i", "I", 3, 1),
    key("o", "O", 3, 1),
    key("p", "P", 3, 1),
    key("a", "A", 3, 2),
    key("s", "S", 3, 2),
    key("d", "D", 3, 2),
    key("f", "F", 3, 2),
    key("g", "G", 3, 2),
    key("h", "H", 3, 2),
    key("j", "J", 3, 2),
    key("k", "K", 3, 2),
    key("l", "L", 3, 2),
    key(";", ";", 3, 2),
    key("enter", "ENTER", 7, 2),
    key("shift-l", "SHIFT", 7, 3),
    key("z", "Z", 3, 3),
    key("x", "X", 3, 3),
    key("c", "C", 3, 3),
    key("v", "V", 3, 3),
    key("b", "B", 3, 3),
    key("n", "N", 3, 3),
    key("m", "M", 3, 3),
    key("shift-r", "SHIFT", 7, 3),
    key("space", "SPACE", 24, 4),
];

pub const KEY_ROWS: usize = 5;

/// Local state of the keyboard coloring activity. Lives inside the lesson
/// view and is dropped (colors and all) when the lesson is left.
#[derive(Debug)]
pub struct KeyboardDiagram {
    selected_color: PaletteColor,
    painted: HashMap<String, PaletteColor>,
    cursor: usize,
}

impl Default for KeyboardDiagram {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardDiagram {
    pub fn new() -> Self {
        Self {
            selected_color: PaletteColor::Pink,
            painted: HashMap::new(),
            cursor: 0,
        }
    }

    pub fn selected_color(&self) -> PaletteColor {
        self.selected_color
    }

    pub fn select_color(&mut self, color: PaletteColor) {
        self.selected_color = color;
    }

    pub fn cycle_color(&mut self) {
        let idx = PALETTE
            .iter()
            .position(|c| *c == self.selected_color)
            .unwrap_or(0);
        self.selected_color = PALETTE[(idx + 1) % PALETTE.len()];
    }

    /// Paint a region with the active color. Last write wins.
    pub fn paint_region(&mut self, region_id: &str) {
        self.painted
            .insert(region_id.to_string(), self.selected_color);
    }

    pub fn region_color(&self, region_id: &str) -> Option<PaletteColor> {
        self.painted.get(region_id).copied()
    }

    pub fn painted_count(&self) -> usize {
        self.painted.len()
    }

    pub fn cursor_region(&self) -> &'static KeyRegion {
        &KEY_MAP[self.cursor]
    }

    pub fn paint_at_cursor(&mut self) {
        let id = KEY_MAP[self.cursor].id;
        self.paint_region(id);
    }

    pub fn move_left(&mut self) {
        let row = KEY_MAP[self.cursor].row;
        if self.cursor > 0 && KEY_MAP[self.cursor - 1].row == row {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        let row = KEY_MAP[self.cursor].row;
        if self.cursor + 1 < KEY_MAP.len() && KEY_MAP[self.cursor + 1].row == row {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.move_to_row(KEY_MAP[self.cursor].row.wrapping_sub(1));
    }

    pub fn move_down(&mut self) {
        self.move_to_row(KEY_MAP[self.cursor].row + 1);
    }

    /// Jump to the key in `row` whose horizontal center is nearest.
    fn move_to_row(&mut self, row: usize) {
        if row >= KEY_ROWS {
            return;
        }
        let target = Self::center_of(self.cursor);
        let nearest = KEY_MAP
            .iter()
            .enumerate()
            .filter(|(_, k)| k.row == row)
            .min_by_key(|(idx, _)| {
                let center = Self::center_of(*idx);
                center.abs_diff(target)
            })
            .map(|(idx, _)| idx);
        if let Some(idx) = nearest {
            self.cursor = idx;
        }
    }

    /// Horizontal center of a key in cells, counting the one-cell gaps.
    fn center_of(idx: usize) -> u16 {
        let row = KEY_MAP[idx].row;
        let offset: u16 = KEY_MAP
            .iter()
            .take(idx)
            .filter(|k| k.row == row)
            .map(|k| k.width + 1)
            .sum();
        offset + KEY_MAP[idx].width / 2
    }
}
