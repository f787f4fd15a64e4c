// Stable window and tab identifiers
//
// Windows and tabs are singletons per logical key, so the keys themselves
// must be predictable and collision-free. All builders here are pure.

/// The kinds of entity the application can search, create and edit.
///
/// This tag is resolved once at the edge (menu click, search screen setup)
/// and drives key construction and card-builder selection from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Franchise,
    Genre,
}

impl EntityKind {
    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Franchise => "franchise",
            EntityKind::Genre => "genre",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Franchise => "franchises",
            EntityKind::Genre => "genres",
        }
    }
}

/// Key for the "New" menu pop-up window.
pub fn new_menu_key() -> &'static str {
    "new_menu"
}

/// Key for a create-form window, e.g. `franchise_form_new`.
pub fn new_form_key(kind: EntityKind) -> String {
    format!("{}_form_new", kind.singular())
}

/// Key for an edit-form window, e.g. `franchise_form_42`.
///
/// The entity id is part of the key so edit windows for different entities
/// coexist while two edits of the same entity collapse into one window.
pub fn edit_form_key(kind: EntityKind, id: i64) -> String {
    format!("{}_form_{}", kind.singular(), id)
}

/// Key for an entity kind's search tab, e.g. `search_franchises`.
pub fn search_tab_key(kind: EntityKind) -> String {
    format!("search_{}", kind.plural())
}

/// Key for an entity instance's details tab, e.g. `franchise_details_42`.
pub fn details_tab_key(kind: EntityKind, id: i64) -> String {
    format!("{}_details_{}", kind.singular(), id)
}
