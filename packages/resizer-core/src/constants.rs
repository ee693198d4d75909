/// 出力画像の最大寸法（幅・高さ）
pub const MAX_DIMENSION: u32 = 4096;

/// 画像の最大ピクセル数（1GP = 実質無制限、極端な攻撃のみ防止）
pub const MAX_PIXELS: u64 = 1_000_000_000;

/// デフォルト品質（1-100）
pub const DEFAULT_QUALITY: u8 = 80;

/// 取得するオブジェクトの最大サイズ（50MiB）
pub const MAX_INPUT_SIZE: u64 = 50 * 1024 * 1024;

/// オブジェクトキーの最大長（S3 の上限）
pub const MAX_KEY_LENGTH: usize = 1024;

/// バリアント処理の同時実行数（デフォルト）
pub const DEFAULT_CONCURRENCY: usize = 2;

/// バリアント処理の同時実行数の上限
pub const MAX_CONCURRENCY: usize = 16;

/// ストレージ操作のタイムアウト（ミリ秒）
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 10_000;

/// 出力キーテンプレート（デフォルト）
///
/// `uploads/cat.jpg` + `thumb` → `uploads/cat-thumb.jpg`
pub const DEFAULT_KEY_TEMPLATE: &str = "{dir}{stem}-{name}.{ext}";

/// 生成したオブジェクトに付けるユーザーメタデータのキー
///
/// S3 では `x-amz-meta-resized-by` として保存される。値はバリアント名。
pub const DERIVED_MARKER_KEY: &str = "resized-by";
