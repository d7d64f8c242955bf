use wasm_bindgen::JsCast;

/// The first file picked in a file input, with its mime type.
pub(super) fn picked_file(input: &web_sys::HtmlInputElement) -> Option<(web_sys::File, String)> {
    let file = input.files()?.get(0)?;
    let mime = file.type_();
    Some((file, mime))
}

pub(super) async fn read_file_bytes(file: web_sys::File) -> Result<Vec<u8>, String> {
    let v = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
        .await
        .map_err(|_| "file: read failed".to_string())?;

    let buf = v
        .dyn_into::<js_sys::ArrayBuffer>()
        .map_err(|_| "file: expected ArrayBuffer".to_string())?;
    let arr = js_sys::Uint8Array::new(&buf);
    let mut out = vec![0u8; arr.length() as usize];
    arr.copy_to(&mut out);
    Ok(out)
}
