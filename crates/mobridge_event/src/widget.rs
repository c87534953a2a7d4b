//! Widget-event record reached through an event's data address.
//!
//! Widget events reuse the generic event record's data field as a pointer
//! to this 24-byte record. It has its own discriminant (the widget event
//! kind); field accessors carry the same per-kind precondition as the
//! primary record's payload accessors.

use mobridge_memory::RawAddr;

use crate::record::EventError;

/// Widget event kinds, fixed by the native ABI.
pub mod widget_kind {
    pub const ITEM_SELECTED: i32 = 1;
    pub const CHECKED_CHANGED: i32 = 2;
    pub const TAB_CHANGED: i32 = 3;
    pub const URL_CHANGED: i32 = 4;
    pub const CLICKED: i32 = 5;
}

/// Raw widget-event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetRecord {
    bytes: [u8; Self::SIZE],
}

impl WidgetRecord {
    pub const SIZE: usize = 24;

    const OFF_EVENT_TYPE: usize = 0;
    const OFF_WIDGET_HANDLE: usize = 4;
    const OFF_LIST_ITEM_INDEX: usize = 8;
    const OFF_CHECKED: usize = 12;
    const OFF_TAB_INDEX: usize = 16;
    const OFF_URL_DATA: usize = 20;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        if bytes.len() < Self::SIZE {
            return Err(EventError::RecordTruncated {
                need: Self::SIZE,
                got: bytes.len(),
            });
        }
        let mut copy = [0u8; Self::SIZE];
        copy.copy_from_slice(&bytes[..Self::SIZE]);
        Ok(Self { bytes: copy })
    }

    /// Copy a record out of memory the native layer populated.
    ///
    /// # Safety
    /// `addr` must point at least [`WidgetRecord::SIZE`] readable bytes.
    pub unsafe fn from_addr(addr: RawAddr) -> Self {
        Self {
            bytes: core::ptr::read_unaligned(addr.as_ptr() as *const [u8; Self::SIZE]),
        }
    }

    /// The widget event kind; meaningful for every record.
    pub fn event_type(&self) -> i32 {
        self.i32_at(Self::OFF_EVENT_TYPE)
    }

    /// The widget the event originated from; meaningful for every record.
    pub fn widget_handle(&self) -> i32 {
        self.i32_at(Self::OFF_WIDGET_HANDLE)
    }

    pub fn list_item_index(&self) -> Result<i32, EventError> {
        self.expect("list item", widget_kind::ITEM_SELECTED)?;
        Ok(self.i32_at(Self::OFF_LIST_ITEM_INDEX))
    }

    pub fn checked(&self) -> Result<bool, EventError> {
        self.expect("checked flag", widget_kind::CHECKED_CHANGED)?;
        Ok(self.i32_at(Self::OFF_CHECKED) != 0)
    }

    pub fn tab_index(&self) -> Result<i32, EventError> {
        self.expect("tab index", widget_kind::TAB_CHANGED)?;
        Ok(self.i32_at(Self::OFF_TAB_INDEX))
    }

    pub fn url_data(&self) -> Result<i32, EventError> {
        self.expect("url data", widget_kind::URL_CHANGED)?;
        Ok(self.i32_at(Self::OFF_URL_DATA))
    }

    /// Build the tagged union for this record.
    pub fn decode(&self) -> Result<WidgetEvent, EventError> {
        let widget = self.widget_handle();
        let event = match self.event_type() {
            widget_kind::ITEM_SELECTED => WidgetEvent::ItemSelected {
                widget,
                item_index: self.list_item_index()?,
            },
            widget_kind::CHECKED_CHANGED => WidgetEvent::CheckedChanged {
                widget,
                checked: self.checked()?,
            },
            widget_kind::TAB_CHANGED => WidgetEvent::TabChanged {
                widget,
                tab_index: self.tab_index()?,
            },
            widget_kind::URL_CHANGED => WidgetEvent::UrlChanged {
                widget,
                url_data: self.url_data()?,
            },
            widget_kind::CLICKED => WidgetEvent::Clicked { widget },
            event_type => WidgetEvent::Unknown { widget, event_type },
        };
        Ok(event)
    }

    fn expect(&self, expected: &'static str, kind: i32) -> Result<(), EventError> {
        let found = self.event_type();
        if found == kind {
            Ok(())
        } else {
            Err(EventError::InvalidDiscriminant { expected, found })
        }
    }

    fn i32_at(&self, off: usize) -> i32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[off..off + 4]);
        i32::from_ne_bytes(b)
    }
}

/// One widget event, fully decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    ItemSelected { widget: i32, item_index: i32 },
    CheckedChanged { widget: i32, checked: bool },
    TabChanged { widget: i32, tab_index: i32 },
    UrlChanged { widget: i32, url_data: i32 },
    Clicked { widget: i32 },
    Unknown { widget: i32, event_type: i32 },
}
