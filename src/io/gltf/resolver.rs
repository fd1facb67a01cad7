use std::ops::Range;
use std::path::PathBuf;

use base64::Engine;

use crate::core::format::{ComponentType, IndexType, Shape, VertexFormat};
use crate::core::texture::Sampler;
use crate::io::gltf::document::Document;
use crate::io::gltf::{json, texture, Config};
use crate::utils::percent_decode;

/// Loads external files referenced by the document. Gets the path of the file
/// relative to the opened file and returns its contents, or `None` if it
/// can't be loaded.
pub type FileCallback = Box<dyn FnMut(&str) -> Option<Vec<u8>>>;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    InvalidAccessor(String),
    #[error("{0}")]
    InvalidBuffer(String),
    #[error("{0}")]
    InvalidBufferView(String),
    #[error("{0}")]
    InvalidUri(String),
    #[error("{0}")]
    Io(String),
}

/// Memoized resolution of one object. A failure is kept and reported again
/// on every later access.
#[derive(Debug, Clone)]
pub(crate) enum Slot<T, E> {
    Unresolved,
    Failed(E),
    Resolved(T),
}

impl<T: Clone, E: Clone> Slot<T, E> {
    fn get(&self) -> Option<Result<T, E>> {
        match self {
            Self::Unresolved => None,
            Self::Failed(e) => Some(Err(e.clone())),
            Self::Resolved(v) => Some(Ok(v.clone())),
        }
    }

    fn from_result(result: &Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Resolved(v.clone()),
            Err(e) => Self::Failed(e.clone()),
        }
    }
}

#[derive(Debug)]
enum BufferData {
    /// Range of the document data, used for the binary chunk.
    Bin(Range<usize>),
    /// Data URI payload or an external file.
    Owned(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BufferView {
    pub buffer: u32,
    pub offset: usize,
    pub length: usize,
    /// 0 if tightly packed.
    pub stride: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SparseAccessor {
    pub count: usize,
    pub index_type: IndexType,
    pub indices_view: u32,
    pub indices_buffer: u32,
    pub indices_offset: usize,
    pub values_view: u32,
    pub values_buffer: u32,
    pub values_offset: usize,
}

/// Typed, validated view of an accessor. All offsets are absolute within the
/// backing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Accessor {
    pub format: VertexFormat,
    pub count: usize,
    /// `None` if the data is implicitly zero.
    pub buffer_view: Option<u32>,
    pub buffer: u32,
    pub offset: usize,
    pub stride: usize,
    pub sparse: Option<SparseAccessor>,
}

impl Accessor {
    pub fn element_size(&self) -> usize {
        self.format.size()
    }

    /// Byte size of the range the elements span in the buffer. Resolved
    /// accessors are known not to overflow here.
    pub fn span(&self) -> usize {
        self.checked_span().unwrap_or(usize::MAX)
    }

    fn checked_span(&self) -> Option<usize> {
        match self.count {
            0 => Some(0),
            count => self.stride.checked_mul(count - 1)?.checked_add(self.element_size()),
        }
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.element_size()
    }
}

/// Memoized resolution state of an opened document.
#[derive(Debug)]
pub(crate) struct Cache {
    buffers: Vec<Slot<BufferData, Err>>,
    buffer_views: Vec<Slot<BufferView, Err>>,
    accessors: Vec<Slot<Accessor, Err>>,
    samplers: Vec<Slot<Sampler, texture::Err>>,
}

impl Cache {
    pub(crate) fn new(document: &Document) -> Self {
        fn slots<T, E>(n: usize) -> Vec<Slot<T, E>> {
            (0..n).map(|_| Slot::Unresolved).collect()
        }
        Self {
            buffers: slots(document.buffers.len()),
            buffer_views: slots(document.buffer_views.len()),
            accessors: slots(document.accessors.len()),
            samplers: slots(document.samplers.len()),
        }
    }
}

/// Borrowed state needed to import objects from an opened document.
pub(crate) struct Resolver<'a> {
    pub document: &'a Document,
    pub config: &'a Config,
    pub cache: &'a mut Cache,
    pub file_callback: Option<&'a mut FileCallback>,
}

impl<'a> Resolver<'a> {
    /// Loads a data URI or an external file. `kind` names what's being
    /// loaded in diagnostics, such as "buffer" or "image".
    pub(crate) fn load_uri(&mut self, uri: &str, kind: &str) -> Result<Vec<u8>, Err> {
        if let Some(data_uri) = uri.strip_prefix("data:") {
            let base64 = match data_uri.split_once(',') {
                Some((media_type, payload)) if media_type.ends_with(";base64") => payload,
                _ => "",
            };
            if base64.is_empty() {
                return Err(Err::InvalidUri("data URI has no base64 payload".to_string()));
            }
            return base64::engine::general_purpose::STANDARD.decode(base64)
                .map_err(|e| Err::InvalidUri(format!("invalid base64 data URI payload: {}", e)));
        }

        let decoded = percent_decode(uri);
        let path = match &self.document.base_path {
            Some(base) => base.join(&decoded),
            None => PathBuf::from(&decoded),
        };
        let path = path.to_string_lossy().into_owned();
        if let Some(callback) = self.file_callback.as_deref_mut() {
            log::debug!("loading {} through a file callback", path);
            return callback(&path)
                .ok_or_else(|| Err::Io(format!("error opening {} through a file callback", path)));
        }
        if self.document.base_path.is_none() {
            return Err(Err::Io(format!(
                "external {}s can be imported only when opening files from the filesystem or if a file callback is present",
                kind
            )));
        }
        std::fs::read(&path).map_err(|e| Err::Io(format!("error opening {}: {}", path, e)))
    }

    /// Resolves a buffer, returning its size.
    pub(crate) fn buffer(&mut self, id: u32) -> Result<usize, Err> {
        let count = self.cache.buffers.len();
        match self.cache.buffers.get(id as usize) {
            None => return Err(Err::InvalidBuffer(format!(
                "buffer index {} out of range for {} buffers", id, count
            ))),
            Some(Slot::Resolved(_)) => return Ok(self.buffer_bytes(id).len()),
            Some(Slot::Failed(e)) => return Err(e.clone()),
            Some(Slot::Unresolved) => {}
        }
        match self.parse_buffer(id) {
            Ok(data) => {
                self.cache.buffers[id as usize] = Slot::Resolved(data);
                Ok(self.buffer_bytes(id).len())
            }
            Err(e) => {
                self.cache.buffers[id as usize] = Slot::Failed(e.clone());
                Err(e)
            }
        }
    }

    fn parse_buffer(&mut self, id: u32) -> Result<BufferData, Err> {
        let document = self.document;
        let gltf_buffer = &document.buffers[id as usize];
        let byte_length = json::get(gltf_buffer, "byteLength", json::as_usize).ok_or_else(|| Err::InvalidBuffer(format!(
            "buffer {} has missing or invalid byteLength property", id
        )))?;

        let data = match gltf_buffer.get("uri") {
            Some(uri) => {
                let uri = json::as_str(uri)
                    .ok_or_else(|| Err::InvalidBuffer(format!("buffer {} has invalid uri property", id)))?;
                BufferData::Owned(self.load_uri(uri, "buffer")?)
            }
            None => match &self.document.bin {
                Some(bin) if id == 0 => BufferData::Bin(bin.clone()),
                _ if byte_length == 0 => BufferData::Owned(Vec::new()),
                _ => return Err(Err::InvalidBuffer(format!("buffer {} has missing uri property", id))),
            },
        };

        let size = match &data {
            BufferData::Bin(range) => range.len(),
            BufferData::Owned(data) => data.len(),
        };
        if size < byte_length {
            return Err(Err::InvalidBuffer(format!(
                "buffer {} is too short, expected {} bytes but got {}", id, byte_length, size
            )));
        }
        Ok(data)
    }

    /// Contents of a resolved buffer, empty if it wasn't resolved.
    pub(crate) fn buffer_bytes(&self, id: u32) -> &[u8] {
        match self.cache.buffers.get(id as usize) {
            Some(Slot::Resolved(BufferData::Bin(range))) => &self.document.data[range.clone()],
            Some(Slot::Resolved(BufferData::Owned(data))) => data,
            _ => &[],
        }
    }

    pub(crate) fn buffer_view(&mut self, id: u32) -> Result<BufferView, Err> {
        let count = self.cache.buffer_views.len();
        let slot = self.cache.buffer_views.get(id as usize).ok_or_else(|| Err::InvalidBufferView(format!(
            "buffer view index {} out of range for {} buffer views", id, count
        )))?;
        if let Some(result) = slot.get() {
            return result;
        }
        let result = self.parse_buffer_view(id);
        self.cache.buffer_views[id as usize] = Slot::from_result(&result);
        result
    }

    fn parse_buffer_view(&mut self, id: u32) -> Result<BufferView, Err> {
        let document = self.document;
        let gltf_view = &document.buffer_views[id as usize];
        let buffer = json::get(gltf_view, "buffer", json::as_u32).ok_or_else(|| Err::InvalidBufferView(format!(
            "buffer view {} has missing or invalid buffer property", id
        )))?;
        let buffer_size = self.buffer(buffer)?;

        let invalid = |what: &str| Err::InvalidBufferView(format!("buffer view {} has {} property", id, what));
        let offset = json::find(gltf_view, "byteOffset", json::as_usize)
            .map_err(|_| invalid("invalid byteOffset"))?
            .unwrap_or(0);
        let length = json::get(gltf_view, "byteLength", json::as_usize)
            .ok_or_else(|| invalid("missing or invalid byteLength"))?;
        let stride = json::find(gltf_view, "byteStride", json::as_u32)
            .map_err(|_| invalid("invalid byteStride"))?
            .unwrap_or(0);

        let required = offset.checked_add(length).ok_or_else(|| Err::InvalidBufferView(format!(
            "buffer view {} range of {} bytes at offset {} is too large", id, length, offset
        )))?;
        if buffer_size < required {
            return Err(Err::InvalidBufferView(format!(
                "buffer view {} needs {} bytes but buffer {} has only {}", id, required, buffer, buffer_size
            )));
        }
        Ok(BufferView { buffer, offset, length, stride: stride as usize })
    }

    /// Bytes of a resolved buffer view.
    pub(crate) fn view_bytes(&self, view: &BufferView) -> &[u8] {
        &self.buffer_bytes(view.buffer)[view.offset..view.offset + view.length]
    }

    pub(crate) fn accessor(&mut self, id: u32) -> Result<Accessor, Err> {
        let count = self.cache.accessors.len();
        let slot = self.cache.accessors.get(id as usize).ok_or_else(|| Err::InvalidAccessor(format!(
            "accessor index {} out of range for {} accessors", id, count
        )))?;
        if let Some(result) = slot.get() {
            return result;
        }
        let result = self.parse_accessor(id);
        self.cache.accessors[id as usize] = Slot::from_result(&result);
        result
    }

    fn parse_accessor(&mut self, id: u32) -> Result<Accessor, Err> {
        let document = self.document;
        let gltf_accessor = &document.accessors[id as usize];
        let invalid = |what: &str| Err::InvalidAccessor(format!("accessor {} has {}", id, what));

        let component_type = json::get(gltf_accessor, "componentType", json::as_u32)
            .ok_or_else(|| invalid("missing or invalid componentType property"))?;
        let component = ComponentType::from_gl(component_type)
            .ok_or_else(|| invalid(&format!("invalid componentType {}", component_type)))?;
        let count = json::get(gltf_accessor, "count", json::as_usize)
            .ok_or_else(|| invalid("missing or invalid count property"))?;
        let shape_name = json::get(gltf_accessor, "type", json::as_str)
            .ok_or_else(|| invalid("missing or invalid type property"))?;
        let shape = Shape::from_gltf(shape_name)
            .ok_or_else(|| invalid(&format!("invalid type {}", shape_name)))?;
        let normalized = json::find(gltf_accessor, "normalized", json::as_bool)
            .map_err(|_| invalid("invalid normalized property"))?
            .unwrap_or(false);

        let format = VertexFormat::new(component, shape, normalized);
        if normalized && matches!(component, ComponentType::UnsignedInt | ComponentType::Float) {
            return Err(Err::InvalidAccessor(format!(
                "accessor {} with component format {} can't be normalized", id, VertexFormat::scalar(component)
            )));
        }
        if shape.is_matrix()
            && component != ComponentType::Float
            && !(normalized && matches!(component, ComponentType::Byte | ComponentType::Short))
        {
            return Err(Err::InvalidAccessor(format!(
                "accessor {} has an unsupported matrix component format {}",
                id, VertexFormat::new(component, Shape::Scalar, normalized)
            )));
        }
        let element_size = format.size();

        let mut accessor = Accessor {
            format,
            count,
            buffer_view: None,
            buffer: 0,
            offset: 0,
            stride: element_size,
            sparse: None,
        };

        accessor.checked_span().ok_or_else(|| Err::InvalidAccessor(format!(
            "accessor {} with {} elements of {} is too large", id, count, format
        )))?;

        if let Some(view_id) = gltf_accessor.get("bufferView") {
            let view_id = json::as_u32(view_id).ok_or_else(|| invalid("invalid bufferView property"))?;
            let view = self.buffer_view(view_id)?;
            if view.stride != 0 && view.stride < element_size {
                return Err(Err::InvalidAccessor(format!(
                    "{}-byte type defined by accessor {} can't fit into buffer view {} stride of {}",
                    element_size, id, view_id, view.stride
                )));
            }
            let offset = json::find(gltf_accessor, "byteOffset", json::as_usize)
                .map_err(|_| invalid("invalid byteOffset property"))?
                .unwrap_or(0);
            accessor.buffer_view = Some(view_id);
            accessor.buffer = view.buffer;
            accessor.offset = view.offset + offset;
            if view.stride != 0 {
                accessor.stride = view.stride;
            }
            let required = accessor.checked_span()
                .and_then(|span| span.checked_add(offset))
                .ok_or_else(|| Err::InvalidAccessor(format!(
                    "accessor {} with {} elements of {} is too large", id, count, format
                )))?;
            if view.length < required {
                return Err(Err::InvalidAccessor(format!(
                    "accessor {} needs {} bytes but buffer view {} has only {}", id, required, view_id, view.length
                )));
            }
        }

        if let Some(sparse) = gltf_accessor.get("sparse") {
            accessor.sparse = Some(self.parse_sparse(id, sparse, count, element_size)?);
        }
        Ok(accessor)
    }

    fn parse_sparse(
        &mut self,
        id: u32,
        sparse: &'a serde_json::Value,
        count: usize,
        element_size: usize,
    ) -> Result<SparseAccessor, Err> {
        let invalid = |what: &str| Err::InvalidAccessor(format!("accessor {} has {}", id, what));
        if !sparse.is_object() {
            return Err(invalid("invalid sparse property"));
        }
        let sparse_count = json::get(sparse, "count", json::as_usize)
            .ok_or_else(|| invalid("missing or invalid sparse count property"))?;
        if sparse_count == 0 || sparse_count > count {
            return Err(Err::InvalidAccessor(format!(
                "accessor {} sparse count {} out of range for {} elements", id, sparse_count, count
            )));
        }

        let indices = sparse.get("indices").filter(|v| v.is_object())
            .ok_or_else(|| invalid("missing or invalid sparse indices property"))?;
        let (indices_view, indices, indices_offset) = self.sparse_view(id, indices, "indices")?;
        let index_component = json::get(&sparse["indices"], "componentType", json::as_u32)
            .ok_or_else(|| invalid("missing or invalid sparse indices componentType property"))?;
        let index_type = ComponentType::from_gl(index_component)
            .and_then(IndexType::from_component)
            .ok_or_else(|| invalid(&format!("invalid sparse indices componentType {}", index_component)))?;
        let too_large = || Err::InvalidAccessor(format!("accessor {} sparse data is too large", id));
        let required = sparse_count.checked_mul(index_type.size())
            .and_then(|size| size.checked_add(indices_offset))
            .ok_or_else(too_large)?;
        if indices.length < required {
            return Err(Err::InvalidAccessor(format!(
                "accessor {} needs {} bytes for sparse indices but buffer view {} has only {}",
                id, required, indices_view, indices.length
            )));
        }

        let values = sparse.get("values").filter(|v| v.is_object())
            .ok_or_else(|| invalid("missing or invalid sparse values property"))?;
        let (values_view, values, values_offset) = self.sparse_view(id, values, "values")?;
        let required = sparse_count.checked_mul(element_size)
            .and_then(|size| size.checked_add(values_offset))
            .ok_or_else(too_large)?;
        if values.length < required {
            return Err(Err::InvalidAccessor(format!(
                "accessor {} needs {} bytes for sparse values but buffer view {} has only {}",
                id, required, values_view, values.length
            )));
        }

        Ok(SparseAccessor {
            count: sparse_count,
            index_type,
            indices_view,
            indices_buffer: indices.buffer,
            indices_offset: indices.offset + indices_offset,
            values_view,
            values_buffer: values.buffer,
            values_offset: values.offset + values_offset,
        })
    }

    /// Resolves the buffer view of sparse indices or values. Returns the view
    /// id, the view and the offset within the view.
    fn sparse_view(&mut self, id: u32, object: &serde_json::Value, what: &str) -> Result<(u32, BufferView, usize), Err> {
        let view_id = json::get(object, "bufferView", json::as_u32).ok_or_else(|| Err::InvalidAccessor(format!(
            "accessor {} has missing or invalid sparse {} bufferView property", id, what
        )))?;
        let view = self.buffer_view(view_id)?;
        if view.stride != 0 {
            return Err(Err::InvalidAccessor(format!(
                "accessor {} sparse {} bufferView {} is strided", id, what, view_id
            )));
        }
        let offset = json::find(object, "byteOffset", json::as_usize)
            .map_err(|_| Err::InvalidAccessor(format!("accessor {} has invalid sparse {} byteOffset property", id, what)))?
            .unwrap_or(0);
        Ok((view_id, view, offset))
    }

    /// Bytes spanned by a buffer-view-backed accessor, empty otherwise.
    pub(crate) fn accessor_bytes(&self, accessor: &Accessor) -> &[u8] {
        if accessor.buffer_view.is_none() {
            return &[];
        }
        &self.buffer_bytes(accessor.buffer)[accessor.offset..accessor.offset + accessor.span()]
    }

    /// Copies accessor elements into a tightly packed array. Accessors without
    /// a buffer view produce zeros. Sparse data is not applied.
    pub(crate) fn contiguous(&self, accessor: &Accessor) -> Vec<u8> {
        let size = accessor.element_size();
        let mut out = vec![0u8; accessor.count * size];
        if accessor.buffer_view.is_none() {
            return out;
        }
        let data = self.accessor_bytes(accessor);
        if accessor.is_contiguous() {
            let n = out.len();
            out.copy_from_slice(&data[..n]);
        } else {
            for (i, element) in out.chunks_exact_mut(size).enumerate() {
                element.copy_from_slice(&data[i * accessor.stride..i * accessor.stride + size]);
            }
        }
        out
    }

    pub(crate) fn sparse_indices(&self, sparse: &SparseAccessor) -> &[u8] {
        let begin = sparse.indices_offset;
        &self.buffer_bytes(sparse.indices_buffer)[begin..begin + sparse.count * sparse.index_type.size()]
    }

    pub(crate) fn sparse_values(&self, sparse: &SparseAccessor, element_size: usize) -> &[u8] {
        let begin = sparse.values_offset;
        &self.buffer_bytes(sparse.values_buffer)[begin..begin + sparse.count * element_size]
    }

    /// Memoized sampler lookup, parsing it with `parse` on first access.
    pub(crate) fn sampler(
        &mut self,
        id: u32,
        parse: impl FnOnce(&serde_json::Value) -> Result<Sampler, texture::Err>,
    ) -> Result<Sampler, texture::Err> {
        let count = self.cache.samplers.len();
        let slot = self.cache.samplers.get(id as usize).ok_or_else(|| texture::Err::InvalidSampler(format!(
            "index {} out of range for {} samplers", id, count
        )))?;
        if let Some(result) = slot.get() {
            return result;
        }
        let result = parse(&self.document.samplers[id as usize]);
        self.cache.samplers[id as usize] = Slot::from_result(&result);
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::shared::ConfigType;
    use serde_json::{json, Value};

    /// Opens a document from JSON and runs `f` with a resolver over it.
    pub(crate) fn with_resolver<T>(value: Value, f: impl FnOnce(&mut Resolver) -> T) -> T {
        with_resolver_and_callback(value, None, f)
    }

    pub(crate) fn with_resolver_and_callback<T>(
        value: Value,
        mut callback: Option<FileCallback>,
        f: impl FnOnce(&mut Resolver) -> T,
    ) -> T {
        let config = Config::default();
        let document = Document::open(serde_json::to_vec(&value).unwrap(), None, &config).unwrap();
        let mut cache = Cache::new(&document);
        let mut resolver = Resolver {
            document: &document,
            config: &config,
            cache: &mut cache,
            file_callback: callback.as_mut(),
        };
        f(&mut resolver)
    }

    /// Data URI with given bytes.
    pub(crate) fn data_uri(bytes: &[u8]) -> String {
        format!("data:application/octet-stream;base64,{}", base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    #[test]
    fn test_data_uri_buffer() {
        let value = json!({
            "asset": {"version": "2.0"},
            "buffers": [
                {"byteLength": 4, "uri": data_uri(&[1, 2, 3, 4])},
                {"byteLength": 8, "uri": data_uri(&[1, 2, 3, 4])},
                {"byteLength": 1, "uri": "data:text/plain,abc"},
                {"byteLength": 1},
                {"byteLength": 0},
            ],
        });
        with_resolver(value, |r| {
            assert_eq!(r.buffer(0), Ok(4));
            assert_eq!(r.buffer_bytes(0), &[1, 2, 3, 4]);
            assert_eq!(r.buffer(1).unwrap_err().to_string(), "buffer 1 is too short, expected 8 bytes but got 4");
            assert_eq!(r.buffer(2).unwrap_err().to_string(), "data URI has no base64 payload");
            assert_eq!(r.buffer(3).unwrap_err().to_string(), "buffer 3 has missing uri property");
            assert_eq!(r.buffer(4), Ok(0));
            assert_eq!(r.buffer(5).unwrap_err().to_string(), "buffer index 5 out of range for 5 buffers");
        });
    }

    #[test]
    fn test_external_buffer_without_base_path() {
        let value = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 4, "uri": "data.bin"}],
        });
        with_resolver(value, |r| {
            assert_eq!(
                r.buffer(0).unwrap_err().to_string(),
                "external buffers can be imported only when opening files from the filesystem or if a file callback is present"
            );
        });
    }

    #[test]
    fn test_file_callback_is_called_once() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let requested = Rc::new(RefCell::new(Vec::new()));
        let log = requested.clone();
        let callback: FileCallback = Box::new(move |path| {
            log.borrow_mut().push(path.to_string());
            (path == "my data.bin").then(|| vec![0u8; 16])
        });
        let value = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 16, "uri": "my%20data.bin"}, {"byteLength": 16, "uri": "missing.bin"}],
            "bufferViews": [{"buffer": 0, "byteLength": 16}, {"buffer": 0, "byteOffset": 8, "byteLength": 8}],
        });
        with_resolver_and_callback(value, Some(callback), |r| {
            assert!(r.buffer_view(0).is_ok());
            assert!(r.buffer_view(1).is_ok());
            assert_eq!(r.buffer(0), Ok(16));
            let err = r.buffer(1).unwrap_err();
            assert_eq!(err.to_string(), "error opening missing.bin through a file callback");
            assert_eq!(r.buffer(1).unwrap_err(), err);
        });
        assert_eq!(*requested.borrow(), vec!["my data.bin".to_string(), "missing.bin".to_string()]);
    }

    #[test]
    fn test_buffer_view_errors() {
        let value = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 8, "uri": data_uri(&[0; 8])}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 4, "byteLength": 8},
                {"byteLength": 8},
                {"buffer": 0, "byteLength": 8, "byteStride": -1},
                {"buffer": 0, "byteOffset": 2, "byteLength": 4, "byteStride": 4},
            ],
        });
        with_resolver(value, |r| {
            assert_eq!(r.buffer_view(0).unwrap_err().to_string(), "buffer view 0 needs 12 bytes but buffer 0 has only 8");
            assert_eq!(r.buffer_view(1).unwrap_err().to_string(), "buffer view 1 has missing or invalid buffer property");
            assert_eq!(r.buffer_view(2).unwrap_err().to_string(), "buffer view 2 has invalid byteStride property");
            let view = r.buffer_view(3).unwrap();
            assert_eq!(view, BufferView { buffer: 0, offset: 2, length: 4, stride: 4 });
            assert_eq!(r.view_bytes(&view), &[0; 4]);
        });
    }

    #[test]
    fn test_huge_buffer_view_range() {
        let value = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 8, "uri": data_uri(&[0; 8])}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 18446744073709551615u64, "byteLength": 4},
                {"buffer": 0, "byteOffset": 4294967295u64, "byteLength": 4294967295u64},
            ],
        });
        with_resolver(value, |r| {
            assert_eq!(r.buffer_view(0).unwrap_err().to_string(), "buffer view 0 has invalid byteOffset property");
            assert_eq!(
                r.buffer_view(1).unwrap_err().to_string(),
                "buffer view 1 needs 8589934590 bytes but buffer 0 has only 8"
            );
        });
    }

    fn accessor_document(accessors: Value) -> Value {
        json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 32, "uri": data_uri(&(0u8..32).collect::<Vec<_>>())}],
            "bufferViews": [
                {"buffer": 0, "byteLength": 32},
                {"buffer": 0, "byteLength": 24, "byteStride": 8},
                {"buffer": 0, "byteOffset": 28, "byteLength": 4},
            ],
            "accessors": accessors,
        })
    }

    #[test]
    fn test_accessor_layout() {
        let value = accessor_document(json!([
            {"bufferView": 1, "byteOffset": 2, "componentType": 5123, "count": 3, "type": "VEC2", "normalized": true},
            {"componentType": 5126, "count": 2, "type": "VEC3"},
        ]));
        with_resolver(value, |r| {
            let a = r.accessor(0).unwrap();
            assert_eq!(a.format.to_string(), "Vector2usNormalized");
            assert_eq!((a.buffer, a.offset, a.stride, a.span()), (0, 2, 8, 20));
            assert_eq!(r.contiguous(&a), vec![2, 3, 4, 5, 10, 11, 12, 13, 18, 19, 20, 21]);
            assert_eq!(r.accessor(0), Ok(a), "memoized result must be identical");

            let a = r.accessor(1).unwrap();
            assert_eq!(a.buffer_view, None);
            assert_eq!(r.contiguous(&a), vec![0; 24]);
        });
    }

    #[test]
    fn test_accessor_errors() {
        let value = accessor_document(json!([
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 1, "componentType": 5126, "count": 1, "type": "VEC3"},
            {"componentType": 5126, "count": 1, "type": "VEC3", "normalized": true},
            {"componentType": 5121, "count": 1, "type": "MAT2"},
            {"componentType": 5127, "count": 1, "type": "SCALAR"},
            {"componentType": 5126, "count": 1, "type": "VEC5"},
            {"componentType": 5126, "type": "VEC3"},
        ]));
        with_resolver(value, |r| {
            assert_eq!(r.accessor(0).unwrap_err().to_string(), "accessor 0 needs 36 bytes but buffer view 0 has only 32");
            assert_eq!(
                r.accessor(1).unwrap_err().to_string(),
                "12-byte type defined by accessor 1 can't fit into buffer view 1 stride of 8"
            );
            assert_eq!(r.accessor(2).unwrap_err().to_string(), "accessor 2 with component format Float can't be normalized");
            assert_eq!(
                r.accessor(3).unwrap_err().to_string(),
                "accessor 3 has an unsupported matrix component format UnsignedByte"
            );
            assert_eq!(r.accessor(4).unwrap_err().to_string(), "accessor 4 has invalid componentType 5127");
            assert_eq!(r.accessor(5).unwrap_err().to_string(), "accessor 5 has invalid type VEC5");
            assert_eq!(r.accessor(6).unwrap_err().to_string(), "accessor 6 has missing or invalid count property");
            assert_eq!(r.accessor(7).unwrap_err().to_string(), "accessor index 7 out of range for 7 accessors");
        });
    }

    #[test]
    fn test_huge_accessor_count() {
        let value = accessor_document(json!([
            {"bufferView": 0, "componentType": 5126, "count": 4611686018427387905u64, "type": "VEC4"},
            {"bufferView": 0, "componentType": 5126, "count": 4294967295u64, "type": "VEC4"},
            {"bufferView": 0, "byteOffset": 4294967295u64, "componentType": 5126, "count": 1, "type": "MAT4"},
        ]));
        with_resolver(value, |r| {
            assert_eq!(r.accessor(0).unwrap_err().to_string(), "accessor 0 has missing or invalid count property");
            assert_eq!(
                r.accessor(1).unwrap_err().to_string(),
                "accessor 1 needs 68719476720 bytes but buffer view 0 has only 32"
            );
            assert_eq!(
                r.accessor(2).unwrap_err().to_string(),
                "accessor 2 needs 4294967359 bytes but buffer view 0 has only 32"
            );
        });
    }

    #[test]
    fn test_sparse_accessor() {
        let value = accessor_document(json!([
            {"componentType": 5121, "count": 4, "type": "SCALAR", "sparse": {
                "count": 2,
                "indices": {"bufferView": 2, "componentType": 5121},
                "values": {"bufferView": 2, "byteOffset": 2},
            }},
            {"componentType": 5121, "count": 4, "type": "SCALAR", "sparse": {
                "count": 2,
                "indices": {"bufferView": 1, "componentType": 5121},
                "values": {"bufferView": 2},
            }},
            {"componentType": 5121, "count": 4, "type": "SCALAR", "sparse": {
                "count": 5,
                "indices": {"bufferView": 2, "componentType": 5121},
                "values": {"bufferView": 2},
            }},
            {"componentType": 5121, "count": 4, "type": "SCALAR", "sparse": {
                "count": 2,
                "indices": {"bufferView": 2, "componentType": 5126},
                "values": {"bufferView": 2},
            }},
            {"componentType": 5123, "count": 4, "type": "SCALAR", "sparse": {
                "count": 2,
                "indices": {"bufferView": 2, "componentType": 5121},
                "values": {"bufferView": 2, "byteOffset": 2},
            }},
        ]));
        with_resolver(value, |r| {
            let a = r.accessor(0).unwrap();
            let sparse = a.sparse.unwrap();
            assert_eq!(r.sparse_indices(&sparse), &[28, 29]);
            assert_eq!(r.sparse_values(&sparse, 1), &[30, 31]);
            assert_eq!(r.accessor(1).unwrap_err().to_string(), "accessor 1 sparse indices bufferView 1 is strided");
            assert_eq!(r.accessor(2).unwrap_err().to_string(), "accessor 2 sparse count 5 out of range for 4 elements");
            assert_eq!(r.accessor(3).unwrap_err().to_string(), "accessor 3 has invalid sparse indices componentType 5126");
            assert_eq!(
                r.accessor(4).unwrap_err().to_string(),
                "accessor 4 needs 6 bytes for sparse values but buffer view 2 has only 4"
            );
        });
    }
}
