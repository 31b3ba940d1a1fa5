//! Callback contract between the decoder and its consumer.

use std::rc::Rc;

use crate::qname::QName;
use crate::typed_value::{DateTime, Decimal, Float};
use crate::{Error, Result};

/// Content of an NS event (EXI §4, Table 4-2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    pub uri: Rc<str>,
    pub prefix: Rc<str>,
    /// The prefix is the one of the element this declaration belongs to.
    pub local_element_ns: bool,
}

/// Receives decoded events from [`Decoder::parse_next`](super::Decoder::parse_next).
///
/// Every slot has a default, so an implementor only overrides what it
/// consumes. A callback returning `Err` stops the decoding loop and the error
/// becomes the result of `parse_next`. Typed callbacks exist for typed
/// content; schema-less streams only ever produce [`string_data`](Self::string_data).
pub trait ContentHandler {
    /// The decoder hit an unrecoverable fault. Not called for errors a
    /// callback returned itself.
    fn fatal_error(&mut self, _error: &Error) {}

    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_element(&mut self, _qname: &QName) -> Result<()> {
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        Ok(())
    }

    /// Attribute name; its value follows as the next data callback.
    fn attribute(&mut self, _qname: &QName) -> Result<()> {
        Ok(())
    }

    fn namespace_declaration(&mut self, _ns: &NamespaceDeclaration) -> Result<()> {
        Ok(())
    }

    fn string_data(&mut self, _value: &str) -> Result<()> {
        Ok(())
    }

    fn decimal_data(&mut self, _value: Decimal) -> Result<()> {
        Ok(())
    }

    fn integer_data(&mut self, _value: i64) -> Result<()> {
        Ok(())
    }

    fn float_data(&mut self, _value: Float) -> Result<()> {
        Ok(())
    }

    fn boolean_data(&mut self, _value: bool) -> Result<()> {
        Ok(())
    }

    fn datetime_data(&mut self, _value: DateTime) -> Result<()> {
        Ok(())
    }

    fn binary_data(&mut self, _value: &[u8]) -> Result<()> {
        Ok(())
    }
}
