use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Document, Object, ObjectId};

/// ドキュメント内の未圧縮ストリームにFlateDecode圧縮を適用する。
///
/// 既にフィルターが設定されているストリームと、圧縮しても小さくならない
/// ストリームはそのまま残す。デコード後の内容は変わらない。
pub fn compress_streams(doc: &mut Document) {
    let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();

    for id in ids {
        let Some(Object::Stream(stream)) = doc.objects.get_mut(&id) else {
            continue;
        };
        if stream.dict.has(b"Filter") || !stream.allows_compression || stream.content.is_empty() {
            continue;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        if encoder.write_all(&stream.content).is_err() {
            continue;
        }
        let Ok(compressed) = encoder.finish() else {
            continue;
        };
        if compressed.len() >= stream.content.len() {
            continue;
        }

        stream.dict.set("Filter", "FlateDecode");
        stream.set_content(compressed);
    }
}

/// 孤立オブジェクト（途中で失敗したページ追加の残骸など）を除去する。
pub fn delete_unused_objects(doc: &mut Document) {
    doc.prune_objects();
}

/// 保存前の最適化パス。
pub fn optimize(doc: &mut Document, compress: bool) {
    delete_unused_objects(doc);
    if compress {
        compress_streams(doc);
    }
}
