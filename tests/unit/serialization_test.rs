//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 序列化单元测试

use oxpit::serialization::{json::JsonSerializer, Serializer, SerializerEnum};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestStruct {
    id: u64,
    name: String,
    tags: Vec<String>,
}

/// 测试JSON序列化器的往返操作
#[test]
fn test_json_serializer_round_trip() {
    let serializer = JsonSerializer;
    let data = TestStruct {
        id: 1,
        name: "test".to_string(),
        tags: vec!["a".into(), "b".into()],
    };

    let text = serializer.serialize(&data).unwrap();
    let deserialized: TestStruct = serializer.deserialize(&text).unwrap();

    assert_eq!(data, deserialized);
}

/// 测试宽松解码
///
/// 无法解析的存储内容按原始字符串返回
#[test]
fn test_decode_lenient_falls_back_to_raw_string() {
    let serializer = SerializerEnum::default();

    assert_eq!(serializer.decode_lenient("{\"a\":[1,2]}"), json!({"a": [1, 2]}));
    assert_eq!(serializer.decode_lenient("null"), Value::Null);
    assert_eq!(
        serializer.decode_lenient("s:5:\"hello\";"),
        json!("s:5:\"hello\";")
    );
    assert_eq!(serializer.decode_lenient(""), json!(""));
}

/// 测试反序列化错误
#[test]
fn test_deserialize_error_is_reported() {
    let serializer = SerializerEnum::default();
    let result: oxpit::Result<TestStruct> = serializer.deserialize("{\"id\":\"nope\"}");
    assert!(matches!(result, Err(oxpit::PitError::Serialization(_))));
}
