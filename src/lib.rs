pub mod ast;
pub mod compile;
pub mod error;
pub mod from_json;
pub mod json;
pub mod parser;
pub mod types;

pub use ast::{DateTimeStyle, Element, Options, PluralType};
pub use compile::{collect_argument_names, compile, compile_ast};
pub use error::{CompileError, ParseError, Position};
pub use parser::{parse, parse_with_options, ParserOptions};
pub use types::{generate_type, generate_type_ast};

// ── WASM FFI ────────────────────────────────────────────────────────

/// Allocate `len` bytes in WASM memory, returning a pointer (null on an
/// impossible layout). The caller must free it with `dealloc(ptr, len)`.
#[no_mangle]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    match std::alloc::Layout::from_size_align(len.max(1), 1) {
        Ok(layout) => unsafe { std::alloc::alloc(layout) },
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a buffer previously returned by `alloc` or by any of the
/// `wasm_*` functions. For null-terminated strings returned by those
/// functions, pass `strlen(ptr) + 1` as `len`.
#[no_mangle]
pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    if let Ok(layout) = std::alloc::Layout::from_size_align(len.max(1), 1) {
        unsafe { std::alloc::dealloc(ptr, layout) };
    }
}

/// Compile a message for a locale.
/// Returns a pointer to a null-terminated JSON document, either
/// `{"ok": "<function source>"}` or `{"error": {...}}`.
#[no_mangle]
pub unsafe extern "C" fn wasm_compile(
    src_ptr: *const u8,
    src_len: usize,
    locale_ptr: *const u8,
    locale_len: usize,
) -> *const u8 {
    let message = unsafe { str_from_raw(src_ptr, src_len) };
    let locale = unsafe { str_from_raw(locale_ptr, locale_len) };
    let json_str = match compile(&message, &locale) {
        Ok(source) => json::ok_to_json(&source),
        Err(err) => json::error_to_json(&err),
    };
    string_to_c_ptr(json_str)
}

/// Generate the argument type of a message.
/// Returns a pointer to a null-terminated JSON document, either
/// `{"ok": "<type>"}` or `{"error": {...}}`.
#[no_mangle]
pub unsafe extern "C" fn wasm_generate_type(src_ptr: *const u8, src_len: usize) -> *const u8 {
    let message = unsafe { str_from_raw(src_ptr, src_len) };
    let json_str = match generate_type(&message) {
        Ok(ty) => json::ok_to_json(&ty),
        Err(err) => json::error_to_json(&CompileError::Parse(err)),
    };
    string_to_c_ptr(json_str)
}

/// Parse a message with the default parser options.
/// Returns a pointer to a null-terminated JSON document, either
/// `{"ok": [<elements>]}` or `{"error": {...}}`.
#[no_mangle]
pub unsafe extern "C" fn wasm_parse(src_ptr: *const u8, src_len: usize) -> *const u8 {
    let message = unsafe { str_from_raw(src_ptr, src_len) };
    let json_str = match parse(&message) {
        Ok(elements) => json::ast_to_json(&elements),
        Err(err) => json::error_to_json(&CompileError::Parse(err)),
    };
    string_to_c_ptr(json_str)
}

/// Borrow `len` bytes at `ptr` as text, replacing invalid UTF-8.
unsafe fn str_from_raw<'a>(ptr: *const u8, len: usize) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() || len == 0 {
        return std::borrow::Cow::Borrowed("");
    }
    let slice = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf8_lossy(slice)
}

/// Convert a String to a null-terminated C pointer with exact allocation size.
/// The allocation size is exactly `s.len() + 1` bytes, so the caller can
/// free with `dealloc(ptr, strlen(ptr) + 1)`.
fn string_to_c_ptr(s: String) -> *const u8 {
    let mut bytes = s.into_bytes();
    bytes.push(0);
    // into_boxed_slice guarantees allocation size == bytes.len()
    let boxed = bytes.into_boxed_slice();
    Box::into_raw(boxed) as *mut u8
}

#[cfg(test)]
mod tests;
