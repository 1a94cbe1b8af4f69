use axum::extract::Multipart;

use super::models::BufferedFile;

/// 从 multipart 表单中取出约定字段名下的第一个文件。
///
/// - 字段名不符、或没有 filename 的同名文本字段一律跳过
/// - 解析失败（格式错误、超出 body 上限等）视为没有文件
/// - 空文件仍然是文件，这里不做大小与类型校验
pub async fn extract_file(mut multipart: Multipart, field_name: &str) -> Option<BufferedFile> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "multipart 解析失败，按未上传文件处理");
                return None;
            }
        };

        if field.name() != Some(field_name) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::debug!(field = field_name, "同名字段不是文件，已跳过");
            continue;
        };

        return match field.bytes().await {
            Ok(bytes) => Some(BufferedFile { bytes, file_name }),
            Err(e) => {
                tracing::debug!(error = %e, "读取上传文件失败，按未上传文件处理");
                None
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, header},
    };

    const BOUNDARY: &str = "----instacard-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    async fn multipart_of(parts: &[Part<'_>]) -> Multipart {
        let mut body = Vec::new();
        for p in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match p {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, file_name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("build request");
        Multipart::from_request(req, &()).await.expect("multipart")
    }

    #[tokio::test]
    async fn picks_named_file_and_ignores_other_fields() {
        let mp = multipart_of(&[
            Part::Text("username", "alice"),
            Part::File("other", "other.bin", b"nope"),
            Part::File("image", "avatar.png", b"0123456789ab"),
        ])
        .await;
        let file = extract_file(mp, "image").await.expect("file");
        assert_eq!(file.file_name, "avatar.png");
        assert_eq!(&file.bytes[..], b"0123456789ab");
    }

    #[tokio::test]
    async fn text_field_with_matching_name_is_not_a_file() {
        let mp = multipart_of(&[Part::Text("image", "not really a file")]).await;
        assert!(extract_file(mp, "image").await.is_none());
    }

    #[tokio::test]
    async fn no_fields_means_no_file() {
        let mp = multipart_of(&[]).await;
        assert!(extract_file(mp, "image").await.is_none());
    }

    #[tokio::test]
    async fn empty_file_is_still_a_file() {
        let mp = multipart_of(&[Part::File("image", "empty.png", b"")]).await;
        let file = extract_file(mp, "image").await.expect("file");
        assert!(file.bytes.is_empty());
        assert_eq!(file.file_name, "empty.png");
    }

    #[tokio::test]
    async fn malformed_body_means_no_file() {
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from("this is not multipart at all"))
            .expect("build request");
        let mp = Multipart::from_request(req, &()).await.expect("multipart");
        assert!(extract_file(mp, "image").await.is_none());
    }
}
