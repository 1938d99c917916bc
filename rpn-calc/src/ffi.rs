use libc::{c_char, c_int, size_t};

/// Returned by [`rpn_calc_evaluate`] on success.
pub const STATUS_OK: c_int = 0;
/// Returned by [`rpn_calc_evaluate`] when its arguments are unusable.
pub const STATUS_INVALID_ARGUMENT: c_int = 1;

/// Copy `error` into a C buffer, truncating it if needed. The result is always
/// NUL-terminated unless the buffer is empty.
unsafe fn fill_error_buffer(output_error: *mut c_char, output_error_len: size_t, error: &str) {
    if output_error.is_null() || output_error_len == 0 {
        return;
    }

    let output_error = std::slice::from_raw_parts_mut(output_error as *mut u8, output_error_len);
    let n = error.len().min(output_error_len - 1);
    output_error[..n].copy_from_slice(&error.as_bytes()[..n]);
    output_error[n] = 0;
}

/// Evaluate an expression.
///
/// # Arguments
///
/// * `input` - NUL-terminated UTF-8 expression.
/// * `out_value` - Where the result is written on success.
/// * `output_error` - The buffer to write the error message to. May be null.
/// * `output_error_len` - The length of the error buffer.
///
/// # Returns
///
/// [`STATUS_OK`] on success, [`STATUS_INVALID_ARGUMENT`] for a null or
/// non-UTF-8 `input` or a null `out_value`, and otherwise the code from
/// [`crate::Error::status_code`].
///
/// # Safety
///
/// `input` must point to a NUL-terminated string, `out_value` must be valid
/// for writes, and `output_error` (if non-null) must be valid for
/// `output_error_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn rpn_calc_evaluate(
    input: *const c_char,
    out_value: *mut f64,
    output_error: *mut c_char,
    output_error_len: size_t,
) -> c_int {
    if input.is_null() || out_value.is_null() {
        unsafe {
            fill_error_buffer(
                output_error,
                output_error_len,
                "Invalid input or output pointer!",
            );
        }
        return STATUS_INVALID_ARGUMENT;
    }

    let input = match unsafe { std::ffi::CStr::from_ptr(input).to_str() } {
        Ok(input) => input,
        Err(_) => {
            unsafe {
                fill_error_buffer(
                    output_error,
                    output_error_len,
                    "Failed to convert the input string to a Rust string!",
                )
            }
            return STATUS_INVALID_ARGUMENT;
        }
    };

    match crate::eval_str(input) {
        Ok(value) => {
            unsafe { *out_value = value };
            STATUS_OK
        }
        Err(e) => {
            unsafe { fill_error_buffer(output_error, output_error_len, &e.to_string()) };
            e.status_code()
        }
    }
}
