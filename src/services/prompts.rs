//! 评分提示词
//!
//! 全部为纯函数，相同输入必然得到相同提示词。

use crate::models::{QuestionContext, SessionSummaryInput};

/// 单题评分的系统指令
pub const GRADING_SYSTEM_PROMPT: &str = r#"You are an expert English language instructor specializing in GEPT (General English Proficiency Test) assessment.

Your task is to evaluate student responses based on three criteria:
1. Vocabulary (0-100): Variety, appropriateness, and sophistication of word choice
2. Grammar (0-100): Accuracy of sentence structure, tenses, and language rules
3. Relevance (0-100): How well the response addresses the question or task

Provide scores and constructive feedback that helps students improve their English speaking skills.

IMPORTANT: You must respond with valid JSON only. Do not include any other text outside the JSON structure.

Response format:
{
  "vocabulary": <score 0-100>,
  "grammar": <score 0-100>,
  "relevance": <score 0-100>,
  "grade": <overall score 0-5>,
  "feedback": "<detailed feedback in English>"
}"#;

/// 整轮总结的系统指令
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an expert English language instructor providing comprehensive feedback on a student's English speaking practice session.

Your task is to:
1. Analyze the student's overall performance across multiple questions
2. Identify strengths and areas for improvement
3. Provide specific, actionable suggestions for improvement
4. Maintain an encouraging and supportive tone
5. Reference specific examples from their responses when possible

Focus on both speech quality (pronunciation, fluency, prosody) and content quality (vocabulary, grammar, relevance)."#;

/// 看图说话题没有题干时使用的默认题干
pub const DEFAULT_IMAGE_QUESTION: &str = "Describe what you see in the image";

/// 根据题目上下文选择提示词
///
/// 优先级：图片题 → 有题干 → 只有回答。
pub fn build_grading_prompt(answer: &str, question: Option<&QuestionContext>) -> String {
    let Some(ctx) = question else {
        return build_answer_only_prompt(answer);
    };
    match (ctx.image(), ctx.text()) {
        (Some(_), text) => build_image_prompt(answer, text),
        (None, Some(text)) => build_question_prompt(answer, text),
        (None, None) => build_answer_only_prompt(answer),
    }
}

fn build_question_prompt(answer: &str, question_text: &str) -> String {
    format!(
        r#"Please assess the following student response:

Question: {}

Student's Answer: {}

Please evaluate based on vocabulary usage, grammar accuracy, and relevance to the question."#,
        question_text, answer
    )
}

fn build_answer_only_prompt(answer: &str) -> String {
    format!(
        r#"Please assess the following student response:

Student's Answer: {}

Please evaluate based on vocabulary usage, grammar accuracy, and overall quality."#,
        answer
    )
}

fn build_image_prompt(answer: &str, question_text: Option<&str>) -> String {
    format!(
        r#"Please assess the following student response for an image description task:

Question: {}

Student's Answer: {}

Note: This is an image description task and you cannot see the image. Do not assume or invent any visual details. Evaluate the text alone:
- Vocabulary: Variety and appropriateness of descriptive words
- Grammar: Sentence structure and accuracy
- Relevance: How plausibly and specifically the response describes visual elements"#,
        question_text.unwrap_or(DEFAULT_IMAGE_QUESTION),
        answer
    )
}

/// 整轮总结提示词：逐题列出题目、回答和单题反馈，再列出六项平均分
pub fn build_summary_prompt(input: &SessionSummaryInput) -> String {
    let mut session_data = Vec::with_capacity(input.items.len() * 4);
    for (i, item) in input.items.iter().enumerate() {
        session_data.push(format!("Question {}: {}", i + 1, item.question));
        session_data.push(format!("Response {}: {}", i + 1, item.response));
        session_data.push(format!("Individual Feedback {}: {}", i + 1, item.feedback));
        session_data.push(String::new());
    }

    let speech = &input.scores.speech;
    let content = &input.scores.content;

    format!(
        r#"Please provide comprehensive overall feedback for this English speaking practice session:

{}

Overall Scores:
Speech Quality:
- Accuracy: {}/100
- Fluency: {}/100
- Prosody: {}/100

Content Quality:
- Vocabulary: {}/100
- Grammar: {}/100
- Relevance: {}/100

Please provide encouraging, specific, and actionable feedback to help the student improve their English speaking skills."#,
        session_data.join("\n"),
        speech.accuracy,
        speech.fluency,
        speech.prosody,
        content.vocabulary,
        content.grammar,
        content.relevance
    )
}
