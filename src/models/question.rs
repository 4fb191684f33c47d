use serde::{Deserialize, Serialize};

/// 评分时附带的题目上下文
///
/// 空字符串与缺省等价。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionContext {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "image_url")]
    pub image: Option<String>,
}

impl QuestionContext {
    pub fn new(text: Option<String>, image: Option<String>) -> Self {
        Self { text, image }
    }

    /// 题干文本（非空时）
    pub fn text(&self) -> Option<&str> {
        non_empty(self.text.as_deref())
    }

    /// 图片引用（非空时）
    pub fn image(&self) -> Option<&str> {
        non_empty(self.image.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_none() && self.image().is_none()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    QuestionAnswering,
    ImageDescription,
}

/// 练习题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeQuestion {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_difficulty() -> String {
    "intermediate".to_string()
}

impl PracticeQuestion {
    /// 转换为评分上下文
    pub fn to_context(&self) -> QuestionContext {
        QuestionContext::new(Some(self.text.clone()), self.image_url.clone())
    }
}

/// 练习题库
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub questions: Vec<PracticeQuestion>,
}

impl QuestionBank {
    /// 内置示例题库（题库文件缺失时使用）
    pub fn builtin() -> Self {
        let qa = |id: &str, text: &str, difficulty: &str| PracticeQuestion {
            id: id.to_string(),
            text: text.to_string(),
            question_type: QuestionType::QuestionAnswering,
            difficulty: difficulty.to_string(),
            image_url: None,
        };
        let img = |id: &str, text: &str, url: &str| PracticeQuestion {
            id: id.to_string(),
            text: text.to_string(),
            question_type: QuestionType::ImageDescription,
            difficulty: default_difficulty(),
            image_url: Some(url.to_string()),
        };

        Self {
            questions: vec![
                qa("qa1", "What is your favorite hobby and why do you enjoy it?", "intermediate"),
                qa(
                    "qa2",
                    "Describe a memorable trip you have taken. Where did you go and what made it special?",
                    "intermediate",
                ),
                qa("qa3", "What are the advantages and disadvantages of social media?", "advanced"),
                img(
                    "img1",
                    "Describe what you see in this image in detail.",
                    "https://example.com/sample1.jpg",
                ),
                img(
                    "img2",
                    "Look at this picture and describe the scene, including the people, objects, and activities.",
                    "https://example.com/sample2.jpg",
                ),
            ],
        }
    }

    pub fn find(&self, id: &str) -> Option<&PracticeQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// 指定类型的题目组成的子题库
    pub fn by_type(&self, question_type: QuestionType) -> QuestionBank {
        QuestionBank {
            questions: self
                .questions
                .iter()
                .filter(|q| q.question_type == question_type)
                .cloned()
                .collect(),
        }
    }
}
